//! Piece and side types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offset between an unpromoted piece code and its promoted form.
const PROMOTE_OFFSET: u8 = 8;

/// Shogi piece kinds, numbered by their engine piece code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 1,
    Lance = 2,
    Knight = 3,
    Silver = 4,
    Gold = 5,
    Bishop = 6,
    Rook = 7,
    King = 8,
    ProPawn = 9,
    ProLance = 10,
    ProKnight = 11,
    ProSilver = 12,
    Horse = 14,
    Dragon = 15,
}

impl PieceKind {
    /// All piece kinds in code order
    pub const ALL: [PieceKind; 14] = [
        PieceKind::Pawn,
        PieceKind::Lance,
        PieceKind::Knight,
        PieceKind::Silver,
        PieceKind::Gold,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::King,
        PieceKind::ProPawn,
        PieceKind::ProLance,
        PieceKind::ProKnight,
        PieceKind::ProSilver,
        PieceKind::Horse,
        PieceKind::Dragon,
    ];

    /// Kinds that can be held in hand and dropped, in hand-mask order
    pub const DROPPABLE: [PieceKind; 7] = [
        PieceKind::Pawn,
        PieceKind::Lance,
        PieceKind::Knight,
        PieceKind::Silver,
        PieceKind::Gold,
        PieceKind::Bishop,
        PieceKind::Rook,
    ];

    /// Look up a kind by its engine code (1-15, 13 unused)
    #[must_use]
    pub fn from_code(code: u8) -> Option<PieceKind> {
        PieceKind::ALL.into_iter().find(|kind| kind.code() == code)
    }

    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn is_promoted(self) -> bool {
        self.code() > PROMOTE_OFFSET
    }

    /// Promoted form of this kind, if it has one.
    #[must_use]
    pub fn promoted(self) -> Option<PieceKind> {
        if self.is_promoted() || matches!(self, PieceKind::Gold | PieceKind::King) {
            return None;
        }
        PieceKind::from_code(self.code() + PROMOTE_OFFSET)
    }

    /// Unpromoted form of this kind (the kind a captured piece becomes in hand).
    #[must_use]
    pub fn unpromoted(self) -> PieceKind {
        if self.is_promoted() {
            PieceKind::from_code(self.code() - PROMOTE_OFFSET).unwrap_or(self)
        } else {
            self
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_droppable(self) -> bool {
        !self.is_promoted() && !matches!(self, PieceKind::King)
    }

    /// Two-letter CSA piece name
    #[must_use]
    pub const fn csa_name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "FU",
            PieceKind::Lance => "KY",
            PieceKind::Knight => "KE",
            PieceKind::Silver => "GI",
            PieceKind::Gold => "KI",
            PieceKind::Bishop => "KA",
            PieceKind::Rook => "HI",
            PieceKind::King => "OU",
            PieceKind::ProPawn => "TO",
            PieceKind::ProLance => "NY",
            PieceKind::ProKnight => "NK",
            PieceKind::ProSilver => "NG",
            PieceKind::Horse => "UM",
            PieceKind::Dragon => "RY",
        }
    }

    /// Parse a two-letter CSA piece name
    #[must_use]
    pub fn from_csa_name(name: &str) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.csa_name() == name)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.csa_name())
    }
}

/// The two players. Black (sente) moves first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Black,
    White,
}

impl Side {
    /// Opponent side
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// Side from the wire turn value (0 = Black, 1 = White)
    #[must_use]
    pub const fn from_turn(turn: u8) -> Option<Side> {
        match turn {
            0 => Some(Side::Black),
            1 => Some(Side::White),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Black => 0,
            Side::White => 1,
        }
    }

    /// CSA side marker ('+' for Black, '-' for White)
    #[inline]
    #[must_use]
    pub const fn csa_marker(self) -> char {
        match self {
            Side::Black => '+',
            Side::White => '-',
        }
    }
}

/// A piece of a given kind owned by a side, as stored in a board square.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Piece { side, kind }
    }

    /// Decode a signed square value (positive = Black, negative = White, 0 = empty)
    #[must_use]
    pub fn from_square_value(value: i32) -> Option<Piece> {
        let code = u8::try_from(value.unsigned_abs()).ok()?;
        let kind = PieceKind::from_code(code)?;
        let side = if value > 0 { Side::Black } else { Side::White };
        Some(Piece { side, kind })
    }

    /// Encode as a signed square value
    #[must_use]
    pub const fn square_value(self) -> i32 {
        let code = self.kind.code() as i32;
        match self.side {
            Side::Black => code,
            Side::White => -code,
        }
    }
}
