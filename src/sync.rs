//! Synchronization primitives for the session layer.
//!
//! Provides the cooperative cancellation flag shared with engine searches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Low bit of the state word: an abort is pending.
const RAISED: u64 = 1;
/// Each raise advances the generation held in the upper bits.
const GENERATION_STEP: u64 = 2;

/// A thread-safe, lock-free abort flag for an in-progress search.
///
/// Raising the signal never blocks and never takes the session lock, so it
/// can be called while another thread holds the lock for a long search.
/// Cancellation is best-effort: the engine core checks the flag periodically
/// and unwinds at its next check, so there is no bound on latency beyond the
/// engine's own check granularity.
///
/// Every raise also advances a generation counter. A caller that takes an
/// [`AbortEpoch`] before waiting on a lock can later [`rearm`](Self::rearm)
/// the signal: stale requests are dropped, requests made while it waited are
/// kept.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicU64>);

/// Snapshot of an [`AbortSignal`]'s generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbortEpoch(u64);

impl AbortSignal {
    /// Create a new signal (initially clear).
    #[must_use]
    pub fn new() -> Self {
        AbortSignal(Arc::new(AtomicU64::new(0)))
    }

    /// Check whether an abort was requested.
    #[inline]
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire) & RAISED != 0
    }

    /// Request that the current search stop.
    #[inline]
    pub fn raise(&self) {
        let _ = self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
            Some(((state & !RAISED).wrapping_add(GENERATION_STEP)) | RAISED)
        });
    }

    /// Current generation, to be handed back to [`rearm`](Self::rearm).
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> AbortEpoch {
        AbortEpoch(self.0.load(Ordering::Acquire) >> 1)
    }

    /// Prepare for a new search that was requested at `since`.
    ///
    /// Clears the signal if nothing raised it after `since` and returns
    /// `true`. Otherwise leaves it raised and returns `false`.
    pub fn rearm(&self, since: AbortEpoch) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                (state >> 1 == since.0).then_some(state & !RAISED)
            })
            .is_ok()
    }
}
