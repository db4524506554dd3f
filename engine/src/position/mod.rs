use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::move_gen;
use crate::square::Square;
use crate::square::Square::*;

mod key;

pub use key::PositionKey;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PositionError {
    #[error("square out of bounds: file {0}, rank {1}")]
    SquareOutOfBounds(u8, u8),

    #[error("square {0} given more than one piece")]
    SquareOccupiedTwice(Square),

    #[error("no {0} king on the board")]
    MissingKing(Side),

    #[error("more than one {0} king on the board")]
    TooManyKings(Side),

    #[error("pawn on back rank at {0}")]
    PawnOnBackRank(Square),

    #[error("{0} is in check but it is not their move")]
    SideNotToMoveInCheck(Side),
}

#[derive(Debug, PartialEq, Eq, EnumIter, EnumString, Clone, Copy, Display, Hash, Deserialize, Serialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Rank direction pawns of this side advance in.
    pub(crate) const fn pawn_direction(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    pub(crate) const fn back_rank(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub(crate) const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl From<Piece> for char {
    fn from(piece: Piece) -> char {
        match piece {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }
}

impl TryFrom<char> for Piece {
    type Error = char;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            'p' => Ok(Piece::Pawn),
            'n' => Ok(Piece::Knight),
            'b' => Ok(Piece::Bishop),
            'r' => Ok(Piece::Rook),
            'q' => Ok(Piece::Queen),
            'k' => Ok(Piece::King),
            _ => Err(value),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Deserialize, Serialize)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    /// Rook source and destination for a castle of `side`.
    pub(crate) const fn rook_squares(self, side: Side) -> (Square, Square) {
        match (side, self) {
            (Side::White, CastleSide::KingSide) => (H1, F1),
            (Side::White, CastleSide::QueenSide) => (A1, D1),
            (Side::Black, CastleSide::KingSide) => (H8, F8),
            (Side::Black, CastleSide::QueenSide) => (A8, D8),
        }
    }
}

/// One occupied square of the externally supplied board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PlacedPiece {
    pub piece: Piece,
    pub side: Side,
    pub file: u8,
    pub rank: u8,
}

impl PlacedPiece {
    pub fn new(piece: Piece, side: Side, square: Square) -> Self {
        Self {
            piece,
            side,
            file: square.file(),
            rank: square.rank(),
        }
    }

    pub fn square(&self) -> Option<Square> {
        Square::from_file_rank(self.file, self.rank)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Move {
    pub src: Square,
    pub dest: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub castle: Option<CastleSide>,
    pub en_passant: bool,
}

impl Move {
    pub fn new(src: Square, dest: Square, piece: Piece) -> Self {
        Self {
            src,
            dest,
            piece,
            captured: None,
            promotion: None,
            castle: None,
            en_passant: false,
        }
    }

    pub fn with_capture(mut self, captured: Piece) -> Self {
        self.captured = Some(captured);
        self
    }

    pub fn with_promotion(mut self, promotion: Piece) -> Self {
        self.promotion = Some(promotion);
        self
    }

    pub(crate) fn castling(side: Side, castle: CastleSide) -> Self {
        let (src, dest) = match (side, castle) {
            (Side::White, CastleSide::KingSide) => (E1, G1),
            (Side::White, CastleSide::QueenSide) => (E1, C1),
            (Side::Black, CastleSide::KingSide) => (E8, G8),
            (Side::Black, CastleSide::QueenSide) => (E8, C8),
        };
        Self {
            castle: Some(castle),
            ..Move::new(src, dest, Piece::King)
        }
    }

    pub(crate) fn en_passant(src: Square, dest: Square) -> Self {
        Self {
            captured: Some(Piece::Pawn),
            en_passant: true,
            ..Move::new(src, dest, Piece::Pawn)
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Square the captured piece stood on. Differs from `dest` only for en passant.
    pub fn capture_square(&self) -> Square {
        if self.en_passant {
            Square::from_index(self.src.rank() as usize * 8 + self.dest.file() as usize)
        } else {
            self.dest
        }
    }

    /// Same squares and promotion, ignoring what it captures in a given position.
    pub(crate) fn same_squares(&self, other: &Move) -> bool {
        self.src == other.src && self.dest == other.dest && self.promotion == other.promotion
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dest)?;
        if let Some(promotion) = self.promotion {
            write!(f, " ({})", promotion)?;
        }
        Ok(())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let src = self.src.to_string().to_ascii_lowercase();
        let dest = self.dest.to_string().to_ascii_lowercase();
        if let Some(promotion) = self.promotion {
            write!(f, "{}{}{}", src, dest, char::from(promotion))
        } else {
            write!(f, "{}{}", src, dest)
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Deserialize, Serialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub fn none() -> Self {
        Self {
            white_king_side: false,
            white_queen_side: false,
            black_king_side: false,
            black_queen_side: false,
        }
    }

    pub fn get(&self, side: Side, castle: CastleSide) -> bool {
        match (side, castle) {
            (Side::White, CastleSide::KingSide) => self.white_king_side,
            (Side::White, CastleSide::QueenSide) => self.white_queen_side,
            (Side::Black, CastleSide::KingSide) => self.black_king_side,
            (Side::Black, CastleSide::QueenSide) => self.black_queen_side,
        }
    }

    /// Any move from or to one of the king or rook home squares clears the
    /// rights tied to it. Rights are never given back.
    fn clear_for_square(&mut self, square: Square) {
        match square {
            E1 => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            H1 => self.white_king_side = false,
            A1 => self.white_queen_side = false,
            E8 => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
            H8 => self.black_king_side = false,
            A8 => self.black_queen_side = false,
            _ => {}
        }
    }

    fn swapped(self) -> Self {
        Self {
            white_king_side: self.black_king_side,
            white_queen_side: self.black_queen_side,
            black_king_side: self.white_king_side,
            black_queen_side: self.white_queen_side,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct State {
    pub to_move: Side,
    pub en_passant_target: Option<Square>,
    pub castling_rights: CastlingRights,
}

#[derive(Clone, Debug)]
struct UndoRecord {
    mve: Move,
    side: Side,
    captured: Option<(Piece, Square)>,
    prev_state: State,
}

#[derive(Clone)]
pub struct Position {
    pub state: State,
    board: [Option<(Piece, Side)>; 64],
    kings: [Square; 2],
    history: Vec<UndoRecord>,
}

impl Position {
    /// Builds a position from an unordered list of occupied squares.
    ///
    /// There is no move history in the input, so a castling right is granted
    /// exactly when the king and the matching rook stand on their home squares,
    /// and there is no en passant target.
    pub fn from_pieces(pieces: &[PlacedPiece], to_move: Side) -> Result<Self, PositionError> {
        let mut board = [None; 64];
        let mut kings: [Option<Square>; 2] = [None, None];

        for placed in pieces {
            let square = placed
                .square()
                .ok_or(PositionError::SquareOutOfBounds(placed.file, placed.rank))?;

            if board[square.index()].is_some() {
                return Err(PositionError::SquareOccupiedTwice(square));
            }
            if placed.piece == Piece::Pawn && (square.rank() == 0 || square.rank() == 7) {
                return Err(PositionError::PawnOnBackRank(square));
            }
            if placed.piece == Piece::King {
                if kings[placed.side.index()].is_some() {
                    return Err(PositionError::TooManyKings(placed.side));
                }
                kings[placed.side.index()] = Some(square);
            }
            board[square.index()] = Some((placed.piece, placed.side));
        }

        let white_king = kings[0].ok_or(PositionError::MissingKing(Side::White))?;
        let black_king = kings[1].ok_or(PositionError::MissingKing(Side::Black))?;

        let has = |square: Square, piece: Piece, side: Side| board[square.index()] == Some((piece, side));
        let castling_rights = CastlingRights {
            white_king_side: has(E1, Piece::King, Side::White) && has(H1, Piece::Rook, Side::White),
            white_queen_side: has(E1, Piece::King, Side::White) && has(A1, Piece::Rook, Side::White),
            black_king_side: has(E8, Piece::King, Side::Black) && has(H8, Piece::Rook, Side::Black),
            black_queen_side: has(E8, Piece::King, Side::Black) && has(A8, Piece::Rook, Side::Black),
        };

        let position = Self {
            state: State {
                to_move,
                en_passant_target: None,
                castling_rights,
            },
            board,
            kings: [white_king, black_king],
            history: Vec::with_capacity(64),
        };

        // The side to move could otherwise take the enemy king.
        if position.in_check(to_move.opposite()) {
            return Err(PositionError::SideNotToMoveInCheck(to_move.opposite()));
        }
        Ok(position)
    }

    pub fn start() -> Self {
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        let mut pieces = Vec::with_capacity(32);
        for (file, &piece) in back_rank.iter().enumerate() {
            let file = file as u8;
            pieces.push(PlacedPiece { piece, side: Side::White, file, rank: 0 });
            pieces.push(PlacedPiece { piece: Piece::Pawn, side: Side::White, file, rank: 1 });
            pieces.push(PlacedPiece { piece: Piece::Pawn, side: Side::Black, file, rank: 6 });
            pieces.push(PlacedPiece { piece, side: Side::Black, file, rank: 7 });
        }
        match Position::from_pieces(&pieces, Side::White) {
            Ok(position) => position,
            Err(e) => panic!("starting layout rejected: {}", e),
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<(Piece, Side)> {
        self.board[square.index()]
    }

    pub fn king_square(&self, side: Side) -> Square {
        self.kings[side.index()]
    }

    pub fn to_move(&self) -> Side {
        self.state.to_move
    }

    pub fn set_to_move(&mut self, side: Side) {
        self.state.to_move = side;
    }

    pub fn in_check(&self, side: Side) -> bool {
        move_gen::is_square_attacked(self, self.king_square(side), side.opposite())
    }

    /// Number of moves that can still be unmade.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece, Side)> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter_map(|(idx, occupant)| occupant.map(|(piece, side)| (Square::from_index(idx), piece, side)))
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(self)
    }

    /// Applies a pseudo-legal move. Whether it leaves the mover in check is the
    /// caller's concern.
    ///
    /// Panics when `src` is empty.
    pub fn make_move(&mut self, mve: Move) {
        let (piece, side) = match self.board[mve.src.index()] {
            Some(occupant) => occupant,
            None => panic!("make_move {:?}: no piece at {}", mve, mve.src),
        };
        debug_assert_eq!(piece, mve.piece, "make_move {:?}: moving piece mismatch", mve);
        debug_assert_eq!(side, self.state.to_move, "make_move {:?}: not side to move", mve);

        let prev_state = self.state;

        let capture_square = mve.capture_square();
        let captured = self.board[capture_square.index()]
            .filter(|&(_, captured_side)| captured_side != side)
            .map(|(captured_piece, _)| (captured_piece, capture_square));
        debug_assert!(
            !matches!(captured, Some((Piece::King, _))),
            "make_move {:?}: captures a king",
            mve
        );
        if captured.is_some() {
            self.board[capture_square.index()] = None;
        }

        self.board[mve.src.index()] = None;
        self.board[mve.dest.index()] = Some((mve.promotion.unwrap_or(piece), side));

        if piece == Piece::King {
            self.kings[side.index()] = mve.dest;
        }

        if let Some(castle) = mve.castle {
            let (rook_src, rook_dest) = castle.rook_squares(side);
            self.board[rook_dest.index()] = self.board[rook_src.index()].take();
        }

        self.state.castling_rights.clear_for_square(mve.src);
        self.state.castling_rights.clear_for_square(mve.dest);

        self.state.en_passant_target = if piece == Piece::Pawn && mve.src.rank().abs_diff(mve.dest.rank()) == 2 {
            Square::from_file_rank(mve.src.file(), (mve.src.rank() + mve.dest.rank()) / 2)
        } else {
            None
        };

        self.state.to_move = side.opposite();

        self.history.push(UndoRecord {
            mve,
            side,
            captured,
            prev_state,
        });
    }

    /// Reverses the last `make_move`. Returns the undone move, or `None` with
    /// the position untouched when there is nothing to undo.
    pub fn unmake_move(&mut self) -> Option<Move> {
        let UndoRecord {
            mve,
            side,
            captured,
            prev_state,
        } = self.history.pop()?;

        let moved = self.board[mve.dest.index()].take();
        debug_assert!(moved.is_some(), "unmake_move {:?}: destination empty", mve);
        self.board[mve.src.index()] = Some((mve.piece, side));

        if let Some((captured_piece, square)) = captured {
            self.board[square.index()] = Some((captured_piece, side.opposite()));
        }

        if let Some(castle) = mve.castle {
            let (rook_src, rook_dest) = castle.rook_squares(side);
            self.board[rook_src.index()] = self.board[rook_dest.index()].take();
        }

        if mve.piece == Piece::King {
            self.kings[side.index()] = mve.src;
        }

        self.state = prev_state;
        Some(mve)
    }

    /// `unmake_move` for callers that just made a move themselves.
    pub(crate) fn undo(&mut self) {
        if self.unmake_move().is_none() {
            panic!("unmake_move without a matching make_move");
        }
    }

    /// The same position with colours exchanged and the board mirrored top to
    /// bottom. Side to move is kept, so the evaluation flips sign.
    pub fn color_swapped(&self) -> Self {
        let mut board = [None; 64];
        for (square, piece, side) in self.pieces() {
            board[square.mirrored().index()] = Some((piece, side.opposite()));
        }
        Self {
            state: State {
                to_move: self.state.to_move,
                en_passant_target: self.state.en_passant_target.map(Square::mirrored),
                castling_rights: self.state.castling_rights.swapped(),
            },
            board,
            kings: [self.kings[1].mirrored(), self.kings[0].mirrored()],
            history: Vec::new(),
        }
    }
}

// Undo history is not part of what a position is.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.board == other.board && self.kings == other.kings
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board_str = String::with_capacity(64 + 7);
        for (idx, square) in Square::list_white_perspective().into_iter().enumerate() {
            let ch = match self.piece_at(square) {
                Some((p, Side::White)) => char::from(p).to_ascii_uppercase(),
                Some((p, Side::Black)) => char::from(p),
                None => '.',
            };
            board_str.push(ch);
            if (idx + 1) % 8 == 0 && idx != 63 {
                board_str.push('\n');
            }
        }
        write!(f, "{}", board_str)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{:?}", self, self.state)
    }
}
