//! Difficulty policy: maps a coarse difficulty level to search limits.
//!
//! Depth is the knob that makes the lower levels weak; node count is never
//! binding and the time budgets come straight from the caller.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EngineCommand, EngineCore, EngineError};

/// Node limit used at every level (effectively unbounded)
pub const UNBOUNDED_NODES: u64 = u64::MAX;

/// Default depth ceiling for the strongest level, in plies
pub const DEFAULT_MAX_DEPTH: u32 = 128;

/// Resignation margin high enough that the engine only resigns when truly lost
pub const NEVER_RESIGN_MARGIN: i32 = 999_999;

/// Depth ceilings for levels 0-3; higher levels use the policy's maximum.
const DEPTH_BY_LEVEL: [u32; 4] = [1, 2, 4, 6];

/// Lowest accepted maximum depth: the deepest fixed level, so raising the
/// level never lowers the depth.
pub const MIN_MAX_DEPTH: u32 = DEPTH_BY_LEVEL[DEPTH_BY_LEVEL.len() - 1];

/// (total seconds, per-turn seconds) think-time budgets for levels 0-15.
const THINK_TIME: [(u32, u32); 16] = [
    (60, 1),
    (60, 1),
    (60, 1),
    (60, 1),
    (60, 1),
    (2 * 60, 10),
    (5 * 60, 20),
    (10 * 60, 40),
    (15 * 60, 60),
    (30 * 60, 60),
    (60 * 60, 60),
    (2 * 60 * 60, 60),
    (3 * 60, 60),
    (4 * 60, 60),
    (5 * 60, 60),
    (6 * 60, 60),
];

/// Resource limits for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchLimits {
    /// Maximum depth in plies
    pub depth_limit: u32,
    /// Maximum nodes
    pub node_limit: u64,
    /// Total think time for the game, in seconds
    pub total_time_secs: u32,
    /// Think time per move, in seconds
    pub per_turn_time_secs: u32,
}

/// Deterministic mapping from difficulty level to [`SearchLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyPolicy {
    max_depth: u32,
}

impl DifficultyPolicy {
    /// Policy whose strongest levels search to `max_depth`, raised to
    /// [`MIN_MAX_DEPTH`] if lower.
    #[must_use]
    pub const fn new(max_depth: u32) -> Self {
        let max_depth = if max_depth < MIN_MAX_DEPTH {
            MIN_MAX_DEPTH
        } else {
            max_depth
        };
        DifficultyPolicy { max_depth }
    }

    #[must_use]
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Depth ceiling for `level`
    #[must_use]
    pub fn depth_limit(&self, level: u32) -> u32 {
        usize::try_from(level)
            .ok()
            .and_then(|i| DEPTH_BY_LEVEL.get(i))
            .copied()
            .unwrap_or(self.max_depth)
    }

    /// Limits for `level` with the caller's time budgets taken verbatim.
    #[must_use]
    pub fn limits(
        &self,
        level: u32,
        total_time_secs: u32,
        per_turn_time_secs: u32,
    ) -> SearchLimits {
        SearchLimits {
            depth_limit: self.depth_limit(level),
            node_limit: UNBOUNDED_NODES,
            total_time_secs,
            per_turn_time_secs,
        }
    }

    /// Configure `engine` for `level`: disable pondering, raise the
    /// resignation threshold, then install the limits.
    pub fn apply<E: EngineCore + ?Sized>(
        &self,
        engine: &mut E,
        level: u32,
        total_time_secs: u32,
        per_turn_time_secs: u32,
    ) -> Result<SearchLimits, EngineError> {
        engine.command(EngineCommand::Ponder(false))?;
        engine.command(EngineCommand::ResignThreshold(NEVER_RESIGN_MARGIN))?;

        let limits = self.limits(level, total_time_secs, per_turn_time_secs);
        engine.set_limits(&limits);
        log::debug!(
            "Set difficulty {level}: nodes={} depth={} total={}s per_turn={}s",
            limits.node_limit,
            limits.depth_limit,
            limits.total_time_secs,
            limits.per_turn_time_secs
        );
        Ok(limits)
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Think-time budget `(total_secs, per_turn_secs)` for a difficulty level.
///
/// Levels above the table clamp to its last entry.
#[must_use]
pub fn think_time_for(level: u32) -> (u32, u32) {
    let last = THINK_TIME.len() - 1;
    let index = usize::try_from(level).map_or(last, |i| i.min(last));
    THINK_TIME[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_table_for_low_levels() {
        let policy = DifficultyPolicy::default();
        assert_eq!(policy.depth_limit(0), 1);
        assert_eq!(policy.depth_limit(1), 2);
        assert_eq!(policy.depth_limit(2), 4);
        assert_eq!(policy.depth_limit(3), 6);
    }

    #[test]
    fn high_levels_use_max_depth() {
        let policy = DifficultyPolicy::new(64);
        assert_eq!(policy.depth_limit(4), 64);
        assert_eq!(policy.depth_limit(15), 64);
        assert_eq!(policy.depth_limit(u32::MAX), 64);
    }

    #[test]
    fn max_depth_floors_at_deepest_level() {
        assert_eq!(DifficultyPolicy::new(0).max_depth(), MIN_MAX_DEPTH);
        assert_eq!(DifficultyPolicy::new(3).depth_limit(4), 6);
        assert_eq!(DifficultyPolicy::new(7).max_depth(), 7);
        assert_eq!(DifficultyPolicy::default().max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn times_pass_through() {
        let limits = DifficultyPolicy::default().limits(2, 300, 20);
        assert_eq!(limits.total_time_secs, 300);
        assert_eq!(limits.per_turn_time_secs, 20);
        assert_eq!(limits.node_limit, UNBOUNDED_NODES);
    }

    #[test]
    fn think_time_table() {
        assert_eq!(think_time_for(0), (60, 1));
        assert_eq!(think_time_for(4), (60, 1));
        assert_eq!(think_time_for(5), (120, 10));
        assert_eq!(think_time_for(11), (7200, 60));
        assert_eq!(think_time_for(12), (180, 60));
        assert_eq!(think_time_for(15), (360, 60));
        assert_eq!(think_time_for(99), (360, 60));
    }
}
