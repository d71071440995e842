//! Move representation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::PieceKind;
use super::square::{Square, NUM_SQUARES};

const TO_MASK: u32 = 0x7F;
const FROM_SHIFT: u32 = 7;
const FROM_MASK: u32 = 0x7F;
const FLAG_PROMOTE: u32 = 1 << 14;
const PIECE_SHIFT: u32 = 15;
const PIECE_MASK: u32 = 0xF;
const CAPTURE_SHIFT: u32 = 19;
const CAPTURE_MASK: u32 = 0xF;

/// Compact 32-bit move representation, the opaque value exchanged with the engine core.
///
/// Encoding:
/// - bits 0-6:   destination square index (0-80)
/// - bits 7-13:  source square index, or `81 + kind - 1` for a drop
/// - bit 14:     promotion flag
/// - bits 15-18: moving piece kind (before promotion)
/// - bits 19-22: captured piece kind (0 = none)
///
/// The all-zero value is the null move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move(u32);

impl Move {
    /// The null move (no move)
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Move(0)
    }

    /// Wrap a raw engine value
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Move(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// A board move of `piece` from `from` to `to`.
    #[must_use]
    pub fn board_move(
        from: Square,
        to: Square,
        piece: PieceKind,
        captured: Option<PieceKind>,
        promote: bool,
    ) -> Self {
        let mut bits = to.index() as u32
            | (from.index() as u32) << FROM_SHIFT
            | u32::from(piece.code()) << PIECE_SHIFT;
        if let Some(captured) = captured {
            bits |= u32::from(captured.code()) << CAPTURE_SHIFT;
        }
        if promote {
            bits |= FLAG_PROMOTE;
        }
        Move(bits)
    }

    /// A drop of `kind` from hand onto `to`.
    #[must_use]
    pub fn drop(kind: PieceKind, to: Square) -> Self {
        let from = NUM_SQUARES as u32 + u32::from(kind.code()) - 1;
        Move(to.index() as u32 | from << FROM_SHIFT | u32::from(kind.code()) << PIECE_SHIFT)
    }

    /// Destination square
    #[must_use]
    pub fn to(self) -> Option<Square> {
        Square::from_index((self.0 & TO_MASK) as usize)
    }

    /// Source square, or `None` for drops and the null move
    #[must_use]
    pub fn from(self) -> Option<Square> {
        if self.is_drop() {
            return None;
        }
        Square::from_index(((self.0 >> FROM_SHIFT) & FROM_MASK) as usize)
    }

    #[inline]
    #[must_use]
    pub const fn is_drop(self) -> bool {
        ((self.0 >> FROM_SHIFT) & FROM_MASK) as usize >= NUM_SQUARES
    }

    #[inline]
    #[must_use]
    pub const fn is_promotion(self) -> bool {
        self.0 & FLAG_PROMOTE != 0
    }

    /// The moving (or dropped) piece kind, before any promotion
    #[must_use]
    pub fn piece(self) -> Option<PieceKind> {
        PieceKind::from_code(((self.0 >> PIECE_SHIFT) & PIECE_MASK) as u8)
    }

    /// The piece kind standing on the destination after the move
    #[must_use]
    pub fn piece_after(self) -> Option<PieceKind> {
        let piece = self.piece()?;
        if self.is_promotion() {
            piece.promoted()
        } else {
            Some(piece)
        }
    }

    /// The captured piece kind, if any
    #[must_use]
    pub fn captured(self) -> Option<PieceKind> {
        PieceKind::from_code(((self.0 >> CAPTURE_SHIFT) & CAPTURE_MASK) as u8)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Move(null)");
        }
        write!(f, "Move({:#x})", self.0)
    }
}
