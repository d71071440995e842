//! CSA coordinate move notation.
//!
//! A CSA move names the source square, the destination square and the piece
//! standing on the destination after the move: "7776FU", "8822UM" (bishop
//! captures and promotes), "0055KI" (gold dropped from hand). An optional
//! leading side marker ("+7776FU") is accepted when parsing; formatting never
//! emits one.
//!
//! # Examples
//! ```
//! use shogi_session::board::{format_csa_move, BoardState, Side};
//!
//! let board = BoardState::initial();
//! let mv = board.parse_csa_move(Side::Black, "7776FU").unwrap();
//! assert_eq!(format_csa_move(mv).as_deref(), Some("7776FU"));
//! ```

use super::error::CsaError;
use super::types::{Move, PieceKind, Side, Square};
use super::BoardState;

/// Size of the engine's move buffer, terminator included.
pub const MOVE_BUFFER_LEN: usize = 12;

/// Longest notation that fits the buffer with room to spare for the terminator.
pub const MAX_NOTATION_LEN: usize = MOVE_BUFFER_LEN - 2;

const BODY_LEN: usize = 6;

fn digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

impl BoardState {
    /// Parse a CSA move for `turn` against this position.
    ///
    /// The codec checks the grammar and that the move fits the position
    /// (own piece on the source, a matching or promoted piece code, drops
    /// from hand onto empty squares). Whether the move is legal under the
    /// rules of shogi is left to the engine core.
    pub fn parse_csa_move(&self, turn: Side, notation: &str) -> Result<Move, CsaError> {
        if notation.len() > MAX_NOTATION_LEN {
            return Err(CsaError::TooLong {
                len: notation.len(),
            });
        }

        let body = match notation.chars().next() {
            Some(marker @ ('+' | '-')) => {
                if marker != turn.csa_marker() {
                    return Err(CsaError::WrongSide { marker });
                }
                &notation[1..]
            }
            _ => notation,
        };

        let invalid = || CsaError::InvalidFormat {
            notation: notation.to_string(),
        };
        let bytes = body.as_bytes();
        if bytes.len() != BODY_LEN || !body.is_ascii() {
            return Err(invalid());
        }
        let digits: Vec<u8> = bytes[..4]
            .iter()
            .map(|&b| digit(b))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;

        let name = &body[4..];
        let named = PieceKind::from_csa_name(name).ok_or_else(|| CsaError::UnknownPiece {
            name: name.to_string(),
        })?;
        let to = Square::from_digits(digits[2], digits[3])?;
        let target = self.piece_at(to);

        if digits[0] == 0 && digits[1] == 0 {
            if !named.is_droppable() {
                return Err(CsaError::InvalidDrop { kind: named });
            }
            if self.hand(turn).count(named) == 0 {
                return Err(CsaError::NotInHand { kind: named });
            }
            if target.is_some() {
                return Err(CsaError::OccupiedDropSquare { square: to });
            }
            return Ok(Move::drop(named, to));
        }

        let from = Square::from_digits(digits[0], digits[1])?;
        let source = self
            .piece_at(from)
            .ok_or(CsaError::EmptySource { square: from })?;
        if source.side != turn {
            return Err(CsaError::NotOwnPiece { square: from });
        }
        if target.is_some_and(|piece| piece.side == turn) {
            return Err(CsaError::OwnPieceOnDestination { square: to });
        }

        let promote = if named == source.kind {
            false
        } else if source.kind.promoted() == Some(named) {
            true
        } else {
            return Err(CsaError::PieceMismatch {
                square: from,
                found: source.kind,
                named,
            });
        };

        Ok(Move::board_move(
            from,
            to,
            source.kind,
            target.map(|piece| piece.kind),
            promote,
        ))
    }
}

/// Format a move value as CSA notation (without side marker).
///
/// Returns `None` for the null move or a value whose fields do not decode.
#[must_use]
pub fn format_csa_move(mv: Move) -> Option<String> {
    if mv.is_null() {
        return None;
    }
    let to = mv.to()?;
    let piece = mv.piece_after()?;
    let from = if mv.is_drop() {
        String::from("00")
    } else {
        mv.from()?.to_string()
    };
    Some(format!("{from}{to}{piece}"))
}
