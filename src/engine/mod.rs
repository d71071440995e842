//! Boundary to the engine core.
//!
//! The engine core owns the authoritative position, both hands, the game
//! history and the status flags, and runs the bounded search. This crate only
//! drives it through [`EngineCore`]; the search algorithm and its internal
//! parallelism are the implementor's concern.

mod controller;
pub mod difficulty;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Move, Position, Side};
use crate::sync::AbortSignal;

pub use controller::{clocks_from_plays, Controller, GameState, Play, Report};
pub use difficulty::{think_time_for, DifficultyPolicy, SearchLimits, MIN_MAX_DEPTH};

/// Game-status flags reported by the engine core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameStatus(u32);

impl GameStatus {
    pub const NONE: GameStatus = GameStatus(0);
    /// The side to move has been checkmated
    pub const MATED: GameStatus = GameStatus(1 << 0);
    /// The game ended in a draw (repetition)
    pub const DRAWN: GameStatus = GameStatus(1 << 1);
    /// A side resigned
    pub const RESIGNED: GameStatus = GameStatus(1 << 2);
    /// The engine was told to quit; never valid while a session is live
    pub const QUIT: GameStatus = GameStatus(1 << 3);

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        GameStatus(bits)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: GameStatus) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: GameStatus) -> Self {
        GameStatus(self.0 | other.0)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (GameStatus::QUIT, "quit"),
            (GameStatus::MATED, "checkmate"),
            (GameStatus::DRAWN, "draw"),
            (GameStatus::RESIGNED, "resigned"),
        ];
        let set: Vec<&str> = names
            .into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
            .collect();
        if set.is_empty() {
            f.write_str("in progress")
        } else {
            f.write_str(&set.join(" "))
        }
    }
}

/// Bookkeeping the engine core performs when a move is applied at the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoveFlags(u8);

impl MoveFlags {
    /// Record the move in the game history (needed for undo)
    pub const HISTORY: MoveFlags = MoveFlags(1 << 0);
    /// Charge the elapsed time to the mover's clock
    pub const TIME: MoveFlags = MoveFlags(1 << 1);
    /// Track repetitions for draw detection
    pub const REPETITION: MoveFlags = MoveFlags(1 << 2);
    /// Reject moves that leave the king in check
    pub const DETECT_HANG: MoveFlags = MoveFlags(1 << 3);
    /// Everything a human move at the root needs
    pub const HUMAN_MOVE: MoveFlags = MoveFlags(0b1111);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Configuration commands understood by the engine core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// Enable or disable thinking on the opponent's time
    Ponder(bool),
    /// Evaluation margin beyond which the engine resigns
    ResignThreshold(i32),
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Ponder(on) => write!(f, "ponder {}", if *on { "on" } else { "off" }),
            EngineCommand::ResignThreshold(margin) => write!(f, "resign {margin}"),
        }
    }
}

/// A failure reported by the engine core, carrying its diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

/// Why a search produced no move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Every legal move leaves the king capturable
    KingHang,
    /// Any other engine failure
    Failed(EngineError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::KingHang => f.write_str("No move keeps the king safe"),
            SearchError::Failed(err) => write!(f, "Search failed: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::KingHang => None,
            SearchError::Failed(err) => Some(err),
        }
    }
}

impl From<EngineError> for SearchError {
    fn from(err: EngineError) -> Self {
        SearchError::Failed(err)
    }
}

/// The engine core driven by a [`SessionManager`](crate::session::SessionManager).
///
/// Implementations are called only while the session lock is held, so they
/// never see concurrent calls. The one exception is the [`AbortSignal`]
/// passed to [`search`](EngineCore::search), which other threads may raise at
/// any time and which the search should poll.
pub trait EngineCore: Send {
    /// One-time setup (tables, opening book, ...). Called at most once.
    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Reset to a new game from `position` with history recording enabled.
    fn new_game(&mut self, position: &Position) -> Result<(), EngineError>;

    /// Apply a configuration command.
    fn command(&mut self, command: EngineCommand) -> Result<(), EngineError>;

    /// Install search limits for subsequent searches.
    fn set_limits(&mut self, limits: &SearchLimits);

    /// Number of worker threads the search may use.
    fn set_workers(&mut self, workers: usize);

    /// Apply a move at the root. An illegal move is rejected without mutation.
    fn make_move(&mut self, mv: Move, flags: MoveFlags) -> Result<(), EngineError>;

    /// Revert the last ply; a no-op at the start of history.
    fn unmake_move(&mut self);

    /// Search the current position under the installed limits and play the
    /// chosen move. Returns the null move when the engine resigns or is
    /// already finished.
    fn search(&mut self, abort: &AbortSignal) -> Result<Move, SearchError>;

    /// Current game-status flags.
    fn status(&self) -> GameStatus;

    /// Snapshot of the current board and hands.
    fn board(&self) -> BoardState;

    /// Side to move.
    fn turn(&self) -> Side;

    /// Reset the remaining clock of each side, in seconds.
    fn reset_time(&mut self, black_secs: u32, white_secs: u32);
}
