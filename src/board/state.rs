//! Board snapshots exchanged between the session layer and its callers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::BoardError;
use super::types::{Hand, Piece, PieceKind, Side, Square, BOARD_SIDE, NUM_SQUARES};

/// Back rank from file 9 to file 1.
const BACK_RANK: [PieceKind; BOARD_SIDE] = [
    PieceKind::Lance,
    PieceKind::Knight,
    PieceKind::Silver,
    PieceKind::Gold,
    PieceKind::King,
    PieceKind::Gold,
    PieceKind::Silver,
    PieceKind::Knight,
    PieceKind::Lance,
];

/// One 9x9 board plus the pieces each side holds in hand.
///
/// Squares are stored in board-index order (see [`Square::index`]); each value
/// is a signed piece code, positive for Black, negative for White, 0 for empty.
/// The square count is always exactly 81.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(into = "BoardWire", try_from = "BoardWire")
)]
pub struct BoardState {
    squares: [i32; NUM_SQUARES],
    captured_black: Hand,
    captured_white: Hand,
}

/// Wire shape of a board: 81 integers plus two non-negative hand masks.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct BoardWire {
    squares: Vec<i32>,
    captured_black: i32,
    captured_white: i32,
}

#[cfg(feature = "serde")]
impl From<BoardState> for BoardWire {
    fn from(board: BoardState) -> Self {
        BoardWire {
            squares: board.squares.to_vec(),
            captured_black: board.captured_black_raw(),
            captured_white: board.captured_white_raw(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<BoardWire> for BoardState {
    type Error = BoardError;

    fn try_from(wire: BoardWire) -> Result<Self, Self::Error> {
        BoardState::from_wire(&wire.squares, wire.captured_black, wire.captured_white)
    }
}

fn hand_from_wire(value: i32) -> Result<Hand, BoardError> {
    u32::try_from(value)
        .ok()
        .and_then(Hand::from_bits)
        .ok_or(BoardError::InvalidHand { value })
}

impl BoardState {
    /// An empty board with empty hands
    #[must_use]
    pub fn empty() -> Self {
        BoardState {
            squares: [0; NUM_SQUARES],
            captured_black: Hand::empty(),
            captured_white: Hand::empty(),
        }
    }

    /// The standard even-game starting position
    #[must_use]
    pub fn initial() -> Self {
        let mut board = BoardState::empty();
        for (i, kind) in BACK_RANK.into_iter().enumerate() {
            board.squares[i] = Piece::new(Side::White, kind).square_value();
            board.squares[8 * BOARD_SIDE + i] = Piece::new(Side::Black, kind).square_value();
            board.squares[2 * BOARD_SIDE + i] =
                Piece::new(Side::White, PieceKind::Pawn).square_value();
            board.squares[6 * BOARD_SIDE + i] =
                Piece::new(Side::Black, PieceKind::Pawn).square_value();
        }
        let place = |board: &mut BoardState, file, rank, piece: Piece| {
            if let Some(sq) = Square::new(file, rank) {
                board.set(sq, Some(piece));
            }
        };
        place(&mut board, 8, 2, Piece::new(Side::White, PieceKind::Rook));
        place(&mut board, 2, 2, Piece::new(Side::White, PieceKind::Bishop));
        place(&mut board, 8, 8, Piece::new(Side::Black, PieceKind::Bishop));
        place(&mut board, 2, 8, Piece::new(Side::Black, PieceKind::Rook));
        board
    }

    /// Build a board from its wire shape, validating every square and both hand masks.
    pub fn from_wire(
        squares: &[i32],
        captured_black: i32,
        captured_white: i32,
    ) -> Result<Self, BoardError> {
        let squares: [i32; NUM_SQUARES] = squares
            .try_into()
            .map_err(|_| BoardError::WrongSquareCount {
                found: squares.len(),
            })?;
        if let Some((index, &value)) = squares
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != 0 && Piece::from_square_value(v).is_none())
        {
            return Err(BoardError::InvalidSquareValue { index, value });
        }
        Ok(BoardState {
            squares,
            captured_black: hand_from_wire(captured_black)?,
            captured_white: hand_from_wire(captured_white)?,
        })
    }

    /// All 81 square values in board-index order
    #[inline]
    #[must_use]
    pub fn squares(&self) -> &[i32; NUM_SQUARES] {
        &self.squares
    }

    /// Piece standing on `square`, if any
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        Piece::from_square_value(self.squares[square.index()])
    }

    /// Place (or clear) a piece
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece.map_or(0, Piece::square_value);
    }

    /// Pieces held in hand by `side`
    #[inline]
    #[must_use]
    pub fn hand(&self, side: Side) -> Hand {
        match side {
            Side::Black => self.captured_black,
            Side::White => self.captured_white,
        }
    }

    pub fn set_hand(&mut self, side: Side, hand: Hand) {
        match side {
            Side::Black => self.captured_black = hand,
            Side::White => self.captured_white = hand,
        }
    }

    /// Black's captured-piece mask as a wire integer
    #[must_use]
    pub fn captured_black_raw(&self) -> i32 {
        self.captured_black.bits() as i32
    }

    /// White's captured-piece mask as a wire integer
    #[must_use]
    pub fn captured_white_raw(&self) -> i32 {
        self.captured_white.bits() as i32
    }

    /// Number of non-empty squares
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|&&v| v != 0).count()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Debug for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardState")
            .field("occupied", &self.occupied())
            .field("captured_black", &self.captured_black)
            .field("captured_white", &self.captured_white)
            .finish()
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "White hand: {}", self.captured_white)?;
        for row in self.squares.chunks(BOARD_SIDE) {
            for value in row {
                match Piece::from_square_value(*value) {
                    Some(piece) => write!(f, "{}{}", piece.side.csa_marker(), piece.kind)?,
                    None => f.write_str(" * ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "Black hand: {}", self.captured_black)
    }
}

/// A board together with the side to move: the input for starting a game.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub board: BoardState,
    pub turn: Side,
}

impl Position {
    #[must_use]
    pub fn new(board: BoardState, turn: Side) -> Self {
        Position { board, turn }
    }

    /// Build from the wire shape: board arrays plus a turn of 0 (Black) or
    /// 1 (White).
    pub fn from_wire(
        squares: &[i32],
        captured_black: i32,
        captured_white: i32,
        turn: u8,
    ) -> Result<Self, BoardError> {
        let turn = Side::from_turn(turn).ok_or(BoardError::InvalidTurn { value: turn })?;
        let board = BoardState::from_wire(squares, captured_black, captured_white)?;
        Ok(Position::new(board, turn))
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(BoardState::initial(), Side::Black)
    }
}
