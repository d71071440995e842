//! Error types for board and move-notation operations.

use std::fmt;

use super::types::{PieceKind, Square, NUM_SQUARES};

/// Error type for square parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// File or rank outside 1-9
    OutOfBounds { file: u8, rank: u8 },
    /// Not a two-digit square
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::OutOfBounds { file, rank } => {
                write!(f, "Square {file}{rank} out of bounds (file and rank must be 1-9)")
            }
            SquareError::InvalidNotation { notation } => {
                write!(f, "Invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}

/// Error type for board snapshots that violate the wire shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Board does not have exactly 81 squares
    WrongSquareCount { found: usize },
    /// A square holds an unknown piece code
    InvalidSquareValue { index: usize, value: i32 },
    /// A captured-piece mask is negative or has stray bits
    InvalidHand { value: i32 },
    /// Side to move is neither 0 (Black) nor 1 (White)
    InvalidTurn { value: u8 },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::WrongSquareCount { found } => {
                write!(f, "Board must have {NUM_SQUARES} squares, found {found}")
            }
            BoardError::InvalidSquareValue { index, value } => {
                write!(f, "Invalid piece code {value} on square index {index}")
            }
            BoardError::InvalidHand { value } => {
                write!(f, "Invalid captured-piece mask {value:#x}")
            }
            BoardError::InvalidTurn { value } => write!(f, "Invalid side to move {value}"),
        }
    }
}

impl std::error::Error for BoardError {}

/// Error type for CSA move parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsaError {
    /// Notation does not fit the move buffer
    TooLong { len: usize },
    /// Notation is not `[+-]FFRRTTKK`
    InvalidFormat { notation: String },
    /// Invalid square in the notation
    InvalidSquare(SquareError),
    /// Unknown two-letter piece name
    UnknownPiece { name: String },
    /// Side marker does not match the side to move
    WrongSide { marker: char },
    /// Source square is empty
    EmptySource { square: Square },
    /// Source square holds an opponent piece
    NotOwnPiece { square: Square },
    /// Named piece is neither the source piece nor its promotion
    PieceMismatch { square: Square, found: PieceKind, named: PieceKind },
    /// Piece kind cannot be dropped
    InvalidDrop { kind: PieceKind },
    /// Drop of a piece that is not in hand
    NotInHand { kind: PieceKind },
    /// Destination holds a piece of the moving side
    OwnPieceOnDestination { square: Square },
    /// Drop onto an occupied square
    OccupiedDropSquare { square: Square },
}

impl fmt::Display for CsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsaError::TooLong { len } => {
                write!(f, "Move notation too long ({len} characters)")
            }
            CsaError::InvalidFormat { notation } => {
                write!(f, "Invalid CSA move '{notation}'")
            }
            CsaError::InvalidSquare(err) => write!(f, "{err}"),
            CsaError::UnknownPiece { name } => {
                write!(f, "Unknown piece '{name}'")
            }
            CsaError::WrongSide { marker } => {
                write!(f, "Side marker '{marker}' does not match the side to move")
            }
            CsaError::EmptySource { square } => {
                write!(f, "No piece on square {square}")
            }
            CsaError::NotOwnPiece { square } => {
                write!(f, "Piece on square {square} belongs to the opponent")
            }
            CsaError::PieceMismatch { square, found, named } => {
                write!(f, "Square {square} holds {found}, cannot become {named}")
            }
            CsaError::InvalidDrop { kind } => {
                write!(f, "{kind} cannot be dropped")
            }
            CsaError::NotInHand { kind } => {
                write!(f, "No {kind} in hand")
            }
            CsaError::OwnPieceOnDestination { square } => {
                write!(f, "Square {square} is occupied by an own piece")
            }
            CsaError::OccupiedDropSquare { square } => {
                write!(f, "Cannot drop onto occupied square {square}")
            }
        }
    }
}

impl std::error::Error for CsaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CsaError::InvalidSquare(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SquareError> for CsaError {
    fn from(err: SquareError) -> Self {
        CsaError::InvalidSquare(err)
    }
}
