//! Shogi board snapshots, move values and CSA move notation.
//!
//! The authoritative game state lives in the engine core; the types here are
//! the values copied in and out of it: 81-square boards with both hands, the
//! packed move value, and the codec between move values and CSA notation.
//!
//! # Example
//! ```
//! use shogi_session::board::{BoardState, PieceKind, Side, Square};
//!
//! let board = BoardState::initial();
//! let king = board.piece_at(Square::new(5, 9).unwrap()).unwrap();
//! assert_eq!((king.side, king.kind), (Side::Black, PieceKind::King));
//! ```

mod csa;
mod error;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use csa::{format_csa_move, MAX_NOTATION_LEN, MOVE_BUFFER_LEN};
pub use error::{BoardError, CsaError, SquareError};
pub use state::{BoardState, Position};
pub use types::{Hand, Move, Piece, PieceKind, Side, Square, BOARD_SIDE, NUM_SQUARES};
