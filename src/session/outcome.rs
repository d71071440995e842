//! Outcome records returned by every session operation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::{format_csa_move, BoardState, Move};
use crate::engine::{EngineCore, GameStatus};

use super::invariant_violation;

/// Result code of a session operation. The integer values are a stable
/// contract with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    IllegalMove = -1,
    Checkmate = -2,
    Resigned = -3,
    Draw = -4,
    InstanceSuperseded = -5,
    InitializationError = -6,
    FatalError = -7,
    NoValidMove = -8,
}

impl Status {
    const ALL: [Status; 9] = [
        Status::Ok,
        Status::IllegalMove,
        Status::Checkmate,
        Status::Resigned,
        Status::Draw,
        Status::InstanceSuperseded,
        Status::InitializationError,
        Status::FatalError,
        Status::NoValidMove,
    ];

    /// Wire code
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire code
    #[must_use]
    pub fn from_code(code: i32) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    /// True when the game has ended
    #[must_use]
    pub const fn is_game_over(self) -> bool {
        matches!(
            self,
            Status::Checkmate | Status::Resigned | Status::Draw | Status::NoValidMove
        )
    }

    /// Map engine status flags to a status, in priority order
    /// checkmate, draw, resigned.
    ///
    /// A quit flag is never valid while a session is live; seeing one aborts
    /// the process.
    #[must_use]
    pub fn from_game_status(flags: GameStatus) -> Status {
        if flags.contains(GameStatus::QUIT) {
            invariant_violation(format_args!(
                "quit flag set on a live session: {:#x}",
                flags.bits()
            ));
        }
        if flags.contains(GameStatus::MATED) {
            Status::Checkmate
        } else if flags.contains(GameStatus::DRAWN) {
            Status::Draw
        } else if flags.contains(GameStatus::RESIGNED) {
            Status::Resigned
        } else {
            Status::Ok
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Ok => "ok",
            Status::IllegalMove => "illegal move",
            Status::Checkmate => "checkmate",
            Status::Resigned => "resigned",
            Status::Draw => "draw",
            Status::InstanceSuperseded => "another game already started",
            Status::InitializationError => "initialization error",
            Status::FatalError => "fatal error",
            Status::NoValidMove => "no valid move",
        };
        f.write_str(text)
    }
}

/// A move made by an operation: the engine value and its CSA notation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayedMove {
    pub value: Move,
    pub notation: String,
}

impl PlayedMove {
    /// Pair an engine-produced move with its notation.
    ///
    /// The engine only produces decodable moves, so a value that cannot be
    /// formatted aborts the process.
    #[must_use]
    pub fn new(value: Move) -> PlayedMove {
        match format_csa_move(value) {
            Some(notation) => PlayedMove { value, notation },
            None => invariant_violation(format_args!(
                "engine produced an unformattable move {:#x}",
                value.raw()
            )),
        }
    }
}

/// The record produced by every session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outcome {
    pub status: Status,
    pub error: Option<String>,
    pub played: Option<PlayedMove>,
    pub board: Option<BoardState>,
}

impl Outcome {
    /// An outcome with no move and no board (rejected before touching the engine).
    #[must_use]
    pub fn rejected(status: Status, error: impl Into<String>) -> Outcome {
        Outcome {
            status,
            error: Some(error.into()),
            played: None,
            board: None,
        }
    }

    /// Build an outcome from the engine's post-operation state, copying the
    /// board out in full.
    pub(crate) fn report<E: EngineCore + ?Sized>(
        label: &str,
        engine: &E,
        status: Status,
        error: Option<String>,
        played: Option<PlayedMove>,
    ) -> Outcome {
        let board = engine.board();
        log::trace!(
            "{label}: captured black {:#x} white {:#x}",
            board.captured_black_raw(),
            board.captured_white_raw()
        );
        log::trace!("{label}: game: {}", engine.status());
        Outcome {
            status,
            error,
            played,
            board: Some(board),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Notation of the played move, if any
    #[must_use]
    pub fn notation(&self) -> Option<&str> {
        self.played.as_ref().map(|p| p.notation.as_str())
    }
}
