//! Session management for a shogi engine shared between a UI thread and a
//! computation thread.
//!
//! [`session::SessionManager`] owns the engine core (anything implementing
//! [`engine::EngineCore`]), serializes every operation behind one lock and
//! rejects operations addressed to a superseded game. [`board`] holds the
//! board model and the CSA move codec; [`engine::Controller`] runs a session
//! from a background thread and reports results over a channel.

pub mod board;
pub mod engine;
pub mod session;
pub mod sync;

pub use board::{BoardState, Move, Piece, PieceKind, Position, Side, Square};
pub use engine::{EngineCore, GameStatus};
pub use session::{GameSetup, InstanceId, Outcome, SessionConfig, SessionManager, Status};
pub use sync::{AbortEpoch, AbortSignal};
