//! Core shogi types.
//!
//! This module contains the fundamental types shared by the codec, the
//! session layer and the engine core boundary:
//! - `PieceKind`, `Piece` and `Side` - piece codes and players
//! - `Square` - 9x9 board coordinates
//! - `Hand` - packed captured-piece counters
//! - `Move` - packed 32-bit move value

mod hand;
mod moves;
mod piece;
mod square;

pub use hand::Hand;
pub use moves::Move;
pub use piece::{Piece, PieceKind, Side};
pub use square::{Square, BOARD_SIDE, NUM_SQUARES};
