//! Session configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::difficulty::{DifficultyPolicy, DEFAULT_MAX_DEPTH, MIN_MAX_DEPTH};

/// Default cap on search worker threads
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Limits the session manager applies on top of caller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Upper bound on the worker count handed to the engine core
    pub max_workers: usize,
    /// Depth ceiling used by the strongest difficulty levels (at least
    /// [`MIN_MAX_DEPTH`] once turned into a policy)
    pub max_depth: u32,
}

impl SessionConfig {
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.max(MIN_MAX_DEPTH);
        self
    }

    /// Clamp a requested worker count into `1..=max_workers`
    #[must_use]
    pub fn workers(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_workers.max(1))
    }

    #[must_use]
    pub fn difficulty_policy(&self) -> DifficultyPolicy {
        DifficultyPolicy::new(self.max_depth)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_workers: DEFAULT_MAX_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
