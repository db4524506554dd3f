use crate::position::{Piece, Position, Side};
use crate::square::Square;

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub(crate) const ORTHOGONAL_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub(crate) const DIAGONAL_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Whether any piece of `by` attacks `square`. Sliding attacks stop at the
/// first occupied square in each direction.
pub fn is_square_attacked(position: &Position, square: Square, by: Side) -> bool {
    let is = |sq: Option<Square>, piece: Piece| {
        sq.and_then(|sq| position.piece_at(sq)) == Some((piece, by))
    };

    // A pawn of `by` attacks diagonally forward, so look one rank behind.
    let behind = -by.pawn_direction();
    if is(square.offset(-1, behind), Piece::Pawn) || is(square.offset(1, behind), Piece::Pawn) {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(df, dr)| is(square.offset(df, dr), Piece::Knight))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(df, dr)| is(square.offset(df, dr), Piece::King))
    {
        return true;
    }

    let first_blocker = |(df, dr): (i8, i8)| {
        let mut curr = square.offset(df, dr);
        while let Some(sq) = curr {
            if let Some(occupant) = position.piece_at(sq) {
                return Some(occupant);
            }
            curr = sq.offset(df, dr);
        }
        None
    };

    let slides = |dirs: &[(i8, i8)], piece: Piece| {
        dirs.iter().any(|&dir| {
            matches!(first_blocker(dir), Some((p, side)) if side == by && (p == piece || p == Piece::Queen))
        })
    };

    slides(&ORTHOGONAL_DIRS, Piece::Rook) || slides(&DIAGONAL_DIRS, Piece::Bishop)
}
