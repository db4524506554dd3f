use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::position::{Piece, Position, Side};

/// Score in centipawns from the point of view of the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Eval(pub i32);

impl Eval {
    pub const DRAW: Eval = Eval(0);
    pub const MATE: Eval = Eval(100_000);
    /// Scores beyond this magnitude are forced mates.
    pub const MATE_THRESHOLD: Eval = Eval(Eval::MATE.0 - 1_000);
    /// Wider than any score a search can produce.
    pub const MAX: Eval = Eval(1_000_000);
    pub const MIN: Eval = Eval(-1_000_000);

    /// Score for delivering mate `ply` half moves from the root.
    pub const fn mate_in(ply: u8) -> Eval {
        Eval(Eval::MATE.0 - ply as i32)
    }

    /// Score for being mated `ply` half moves from the root.
    pub const fn mated_in(ply: u8) -> Eval {
        Eval(-(Eval::MATE.0 - ply as i32))
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub const fn is_mate(self) -> bool {
        self.0 > Eval::MATE_THRESHOLD.0 || self.0 < -Eval::MATE_THRESHOLD.0
    }

    pub const fn flip(self) -> Eval {
        Eval(-self.0)
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Eval {
        self.flip()
    }
}

impl Add<i32> for Eval {
    type Output = Eval;

    fn add(self, rhs: i32) -> Eval {
        Eval(self.0 + rhs)
    }
}

impl Sub<i32> for Eval {
    type Output = Eval;

    fn sub(self, rhs: i32) -> Eval {
        Eval(self.0 - rhs)
    }
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            // Full moves, negative when we are the one getting mated
            let plies = Eval::MATE.0 - self.0.abs();
            let moves = (plies + 1) / 2;
            if self.0 > 0 {
                write!(f, "mate {}", moves)
            } else {
                write!(f, "mate -{}", moves)
            }
        } else {
            write!(f, "cp {}", self.0)
        }
    }
}

pub trait EvaluatePosition {
    fn evaluate(&self, position: &Position) -> Eval;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PositionEvaluator;

pub static POSITION_EVALUATOR: PositionEvaluator = PositionEvaluator {};

pub const BISHOP_PAIR_BONUS: i32 = 50;

impl EvaluatePosition for PositionEvaluator {
    /// Material plus piece-square bonus for each side, plus the bishop pair.
    fn evaluate(&self, position: &Position) -> Eval {
        let mut score = 0;
        let mut bishops = [0u8; 2];

        for (square, piece, side) in position.pieces() {
            // Tables are laid out as seen by white, eighth rank first.
            let row = match side {
                Side::White => 7 - square.rank() as usize,
                Side::Black => square.rank() as usize,
            };
            let piece_score = piece_value(piece) + PIECE_SQUARE_TABLES[piece.index()][row][square.file() as usize];

            if piece == Piece::Bishop {
                bishops[side.index()] += 1;
            }
            match side {
                Side::White => score += piece_score,
                Side::Black => score -= piece_score,
            }
        }

        if bishops[Side::White.index()] >= 2 {
            score += BISHOP_PAIR_BONUS;
        }
        if bishops[Side::Black.index()] >= 2 {
            score -= BISHOP_PAIR_BONUS;
        }

        match position.to_move() {
            Side::White => Eval(score),
            Side::Black => Eval(-score),
        }
    }
}

pub const fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 950,
        Piece::King => 20_000,
    }
}

type PieceSquareTable = [[i32; 8]; 8];

#[rustfmt::skip]
const PAWN_TABLE: PieceSquareTable = [
    [ 0,  0,   0,   0,   0,   0,  0,  0],
    [50, 50,  50,  50,  50,  50, 50, 50],
    [10, 10,  20,  30,  30,  20, 10, 10],
    [ 5,  5,  10,  25,  25,  10,  5,  5],
    [ 0,  0,   0,  20,  20,   0,  0,  0],
    [ 5, -5, -10,   0,   0, -10, -5,  5],
    [ 5, 10,  10, -20, -20,  10, 10,  5],
    [ 0,  0,   0,   0,   0,   0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT_TABLE: PieceSquareTable = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20,   0,   0,   0,   0, -20, -40],
    [-30,   0,  10,  15,  15,  10,   0, -30],
    [-30,   5,  15,  20,  20,  15,   5, -30],
    [-30,   0,  15,  20,  20,  15,   0, -30],
    [-30,   5,  10,  15,  15,  10,   5, -30],
    [-40, -20,   0,   5,   5,   0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

#[rustfmt::skip]
const BISHOP_TABLE: PieceSquareTable = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-10,   0,   5,  10,  10,   5,   0, -10],
    [-10,   5,   5,  10,  10,   5,   5, -10],
    [-10,   0,  10,  10,  10,  10,   0, -10],
    [-10,  10,  10,  10,  10,  10,  10, -10],
    [-10,   5,   0,   0,   0,   0,   5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

#[rustfmt::skip]
const ROOK_TABLE: PieceSquareTable = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [ 5, 10, 10, 10, 10, 10, 10,  5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [ 0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const KING_TABLE: PieceSquareTable = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [ 20,  20,   0,   0,   0,   0,  20,  20],
    [ 20,  30,  10,   0,   0,  10,  30,  20],
];

/// The queen reuses the bishop table, tripled.
const QUEEN_TABLE: PieceSquareTable = scaled(BISHOP_TABLE, 3);

const fn scaled(table: PieceSquareTable, factor: i32) -> PieceSquareTable {
    let mut out = [[0; 8]; 8];
    let mut row = 0;
    while row < 8 {
        let mut col = 0;
        while col < 8 {
            out[row][col] = table[row][col] * factor;
            col += 1;
        }
        row += 1;
    }
    out
}

/// Indexed by `Piece::index`.
const PIECE_SQUARE_TABLES: [PieceSquareTable; 6] = [
    PAWN_TABLE,
    KNIGHT_TABLE,
    BISHOP_TABLE,
    ROOK_TABLE,
    QUEEN_TABLE,
    KING_TABLE,
];
