//! Captured pieces held in hand, packed into a single integer.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::PieceKind;

/// (shift, width) of each droppable kind's counter, in `PieceKind::DROPPABLE` order.
const FIELDS: [(u32, u32); 7] = [
    (0, 5),  // pawn
    (5, 3),  // lance
    (8, 3),  // knight
    (11, 3), // silver
    (14, 3), // gold
    (17, 2), // bishop
    (19, 2), // rook
];

/// Union of every counter field.
const VALID_BITS: u32 = (1 << 21) - 1;

/// Pieces captured by one side, packed as bit-field counters.
///
/// Layout: pawn bits 0-4, lance 5-7, knight 8-10, silver 11-13, gold 14-16,
/// bishop 17-18, rook 19-20.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hand(u32);

impl Hand {
    /// An empty hand
    #[must_use]
    pub const fn empty() -> Self {
        Hand(0)
    }

    /// Wrap a raw mask. Returns `None` if bits outside the counter fields are set.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !VALID_BITS != 0 {
            None
        } else {
            Some(Hand(bits))
        }
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn field(kind: PieceKind) -> Option<(u32, u32)> {
        let slot = PieceKind::DROPPABLE.iter().position(|k| *k == kind)?;
        Some(FIELDS[slot])
    }

    /// Number of pieces of `kind` in hand (always 0 for non-droppable kinds)
    #[must_use]
    pub fn count(self, kind: PieceKind) -> u32 {
        Hand::field(kind).map_or(0, |(shift, width)| (self.0 >> shift) & ((1 << width) - 1))
    }

    /// Add a captured piece, demoting it first.
    ///
    /// Returns `None` when the counter would overflow.
    #[must_use]
    pub fn with_added(self, kind: PieceKind) -> Option<Hand> {
        let kind = kind.unpromoted();
        let (shift, width) = Hand::field(kind)?;
        if self.count(kind) + 1 >= 1 << width {
            return None;
        }
        Some(Hand(self.0 + (1 << shift)))
    }

    /// Remove one piece of `kind` (for a drop). Returns `None` when none is held.
    #[must_use]
    pub fn with_removed(self, kind: PieceKind) -> Option<Hand> {
        let (shift, _) = Hand::field(kind)?;
        if self.count(kind) == 0 {
            return None;
        }
        Some(Hand(self.0 - (1 << shift)))
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let mut first = true;
        for kind in PieceKind::DROPPABLE {
            let n = self.count(kind);
            if n == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{kind}x{n}")?;
            first = false;
        }
        Ok(())
    }
}
