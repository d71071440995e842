//! Square types and utilities.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::error::SquareError;

/// Number of files (and ranks) on the board.
pub const BOARD_SIDE: usize = 9;

/// Number of squares on the board.
pub const NUM_SQUARES: usize = BOARD_SIDE * BOARD_SIDE;

/// A square on the shogi board, named by (file, rank) as in CSA and kifu notation.
///
/// Files run 1-9 from Black's right to left, ranks run 1-9 from White's side
/// to Black's side. Square index 0 is file 9 rank 1, index 80 is file 1 rank 9.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Create a new square with bounds checking (both coordinates 1-9)
    #[must_use]
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if (1..=9).contains(&file) && (1..=9).contains(&rank) {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Create a square from its board index (0-80)
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_SQUARES {
            return None;
        }
        let rank = (index / BOARD_SIDE) as u8 + 1;
        let file = (BOARD_SIDE - index % BOARD_SIDE) as u8;
        Some(Square { file, rank })
    }

    /// Get the file (1-9)
    #[inline]
    #[must_use]
    pub const fn file(self) -> u8 {
        self.file
    }

    /// Get the rank (1-9)
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// Get the square's board index (0-80)
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        (self.rank as usize - 1) * BOARD_SIDE + (BOARD_SIDE - self.file as usize)
    }

    /// Parse the two-digit "FR" form used by CSA moves (e.g. "77").
    pub(crate) fn from_digits(file: u8, rank: u8) -> Result<Self, SquareError> {
        Square::new(file, rank).ok_or(SquareError::OutOfBounds { file, rank })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file, self.rank)
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(SquareError::InvalidNotation {
                notation: s.to_string(),
            });
        }
        Square::from_digits(bytes[0] - b'0', bytes[1] - b'0')
    }
}
