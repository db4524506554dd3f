mod attacks;

use arrayvec::ArrayVec;

use crate::position::{CastleSide, Move, Piece, Position, Side};
use crate::square::Square;

pub use self::attacks::is_square_attacked;
use self::attacks::{DIAGONAL_DIRS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONAL_DIRS};

pub type MoveList = ArrayVec<Move, 256>;

/// Every pseudo-legal move of `side`, in board order (a1 first). Moves may
/// leave the mover's own king attacked, callers filter those with
/// [`is_legal`] or by checking after `make_move`.
pub fn pseudo_moves(position: &Position, side: Side, captures_only: bool) -> MoveList {
    let mut moves = MoveList::new();

    for (square, piece, piece_side) in position.pieces() {
        if piece_side != side {
            continue;
        }
        match piece {
            Piece::Pawn => gen_pawn_moves(position, square, side, captures_only, &mut moves),
            Piece::Knight => gen_leaping_moves(position, square, piece, side, &KNIGHT_OFFSETS, captures_only, &mut moves),
            Piece::King => {
                gen_leaping_moves(position, square, piece, side, &KING_OFFSETS, captures_only, &mut moves);
                if !captures_only {
                    gen_castling_moves(position, square, side, &mut moves);
                }
            }
            Piece::Bishop => gen_sliding_moves(position, square, piece, side, &DIAGONAL_DIRS, captures_only, &mut moves),
            Piece::Rook => gen_sliding_moves(position, square, piece, side, &ORTHOGONAL_DIRS, captures_only, &mut moves),
            Piece::Queen => {
                gen_sliding_moves(position, square, piece, side, &ORTHOGONAL_DIRS, captures_only, &mut moves);
                gen_sliding_moves(position, square, piece, side, &DIAGONAL_DIRS, captures_only, &mut moves);
            }
        }
    }

    moves
}

/// Pseudo-legal moves of the side to move that don't leave its king attacked.
pub fn legal_moves(position: &mut Position) -> MoveList {
    let side = position.to_move();
    pseudo_moves(position, side, false)
        .into_iter()
        .filter(|&mve| is_legal(position, mve))
        .collect()
}

/// Try-then-undo legality test for a pseudo-legal move of the side to move.
pub fn is_legal(position: &mut Position, mve: Move) -> bool {
    let side = position.to_move();
    position.make_move(mve);
    let legal = !position.in_check(side);
    position.undo();
    legal
}

/// Whether playing `mve` attacks the opponent's king.
pub fn gives_check(position: &mut Position, mve: Move) -> bool {
    let opponent = position.to_move().opposite();
    position.make_move(mve);
    let check = position.in_check(opponent);
    position.undo();
    check
}

/// True when the side to move has at least one legal move.
pub fn has_legal_move(position: &mut Position) -> bool {
    let side = position.to_move();
    pseudo_moves(position, side, false)
        .into_iter()
        .any(|mve| is_legal(position, mve))
}

fn push_pawn_move(moves: &mut MoveList, mve: Move, side: Side) {
    let promotion_rank = side.opposite().back_rank();
    if mve.dest.rank() == promotion_rank {
        for promotion in Piece::PROMOTIONS {
            moves.push(mve.with_promotion(promotion));
        }
    } else {
        moves.push(mve);
    }
}

fn gen_pawn_moves(position: &Position, square: Square, side: Side, captures_only: bool, moves: &mut MoveList) {
    let dir = side.pawn_direction();

    if !captures_only {
        if let Some(one) = square.offset(0, dir).filter(|&sq| position.piece_at(sq).is_none()) {
            push_pawn_move(moves, Move::new(square, one, Piece::Pawn), side);

            let start_rank = side.back_rank() as i8 + dir;
            if square.rank() as i8 == start_rank {
                if let Some(two) = one.offset(0, dir).filter(|&sq| position.piece_at(sq).is_none()) {
                    moves.push(Move::new(square, two, Piece::Pawn));
                }
            }
        }
    }

    for file_delta in [-1, 1] {
        let Some(target) = square.offset(file_delta, dir) else {
            continue;
        };
        match position.piece_at(target) {
            Some((captured, target_side)) if target_side != side => {
                push_pawn_move(moves, Move::new(square, target, Piece::Pawn).with_capture(captured), side);
            }
            None if position.state.en_passant_target == Some(target) => {
                let mve = Move::en_passant(square, target);
                if position.piece_at(mve.capture_square()) == Some((Piece::Pawn, side.opposite())) {
                    moves.push(mve);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn gen_leaping_moves(
    position: &Position,
    square: Square,
    piece: Piece,
    side: Side,
    offsets: &[(i8, i8)],
    captures_only: bool,
    moves: &mut MoveList,
) {
    for &(df, dr) in offsets {
        let Some(target) = square.offset(df, dr) else {
            continue;
        };
        match position.piece_at(target) {
            None if !captures_only => moves.push(Move::new(square, target, piece)),
            Some((captured, target_side)) if target_side != side => {
                moves.push(Move::new(square, target, piece).with_capture(captured))
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn gen_sliding_moves(
    position: &Position,
    square: Square,
    piece: Piece,
    side: Side,
    dirs: &[(i8, i8)],
    captures_only: bool,
    moves: &mut MoveList,
) {
    for &(df, dr) in dirs {
        let mut curr = square.offset(df, dr);
        while let Some(target) = curr {
            match position.piece_at(target) {
                None => {
                    if !captures_only {
                        moves.push(Move::new(square, target, piece));
                    }
                }
                Some((captured, target_side)) => {
                    if target_side != side {
                        moves.push(Move::new(square, target, piece).with_capture(captured));
                    }
                    break;
                }
            }
            curr = target.offset(df, dr);
        }
    }
}

fn gen_castling_moves(position: &Position, king_square: Square, side: Side, moves: &mut MoveList) {
    let rights = position.state.castling_rights;
    if !rights.get(side, CastleSide::KingSide) && !rights.get(side, CastleSide::QueenSide) {
        return;
    }
    let opponent = side.opposite();
    if is_square_attacked(position, king_square, opponent) {
        return;
    }

    let rank = side.back_rank();
    let sq = |file: u8| Square::from_index(rank as usize * 8 + file as usize);
    let empty = |file: u8| position.piece_at(sq(file)).is_none();
    let safe = |file: u8| !is_square_attacked(position, sq(file), opponent);

    if rights.get(side, CastleSide::KingSide) && empty(5) && empty(6) && safe(5) && safe(6) {
        debug_assert_eq!(position.piece_at(sq(7)), Some((Piece::Rook, side)));
        moves.push(Move::castling(side, CastleSide::KingSide));
    }
    if rights.get(side, CastleSide::QueenSide) && empty(3) && empty(2) && empty(1) && safe(3) && safe(2) {
        debug_assert_eq!(position.piece_at(sq(0)), Some((Piece::Rook, side)));
        moves.push(Move::castling(side, CastleSide::QueenSide));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::parse_placement;
    use crate::square::Square::*;
    use test_case::test_case;

    fn position(placement: &str, to_move: Side) -> Position {
        Position::from_pieces(&parse_placement(placement).unwrap(), to_move).unwrap()
    }

    fn has_move(moves: &MoveList, src: Square, dest: Square) -> bool {
        moves.iter().any(|mve| mve.src == src && mve.dest == dest)
    }

    #[test]
    fn test_start_position_moves() {
        let mut position = Position::start();
        let moves = legal_moves(&mut position);

        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|mve| matches!(mve.piece, Piece::Pawn | Piece::Knight)));
    }

    #[test]
    fn test_captures_only() {
        let position = position("4k3/8/8/3p4/4P3/8/8/4K3", Side::White);
        let moves = pseudo_moves(&position, Side::White, true);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0], Move::new(E4, D5, Piece::Pawn).with_capture(Piece::Pawn));
    }

    #[test]
    fn test_promotions() {
        let position = position("1n2k3/P7/8/8/8/8/8/4K3", Side::White);
        let moves: Vec<Move> = pseudo_moves(&position, Side::White, false)
            .into_iter()
            .filter(|mve| mve.piece == Piece::Pawn)
            .collect();

        assert_eq!(moves.len(), 8);
        for promotion in Piece::PROMOTIONS {
            assert!(moves.contains(&Move::new(A7, A8, Piece::Pawn).with_promotion(promotion)));
            assert!(moves.contains(&Move::new(A7, B8, Piece::Pawn).with_capture(Piece::Knight).with_promotion(promotion)));
        }
    }

    #[test]
    fn test_en_passant_generated() {
        let mut position = position("4k3/3p4/8/4P3/8/8/8/4K3", Side::Black);
        position.make_move(Move::new(D7, D5, Piece::Pawn));

        let moves = legal_moves(&mut position);
        assert!(moves.contains(&Move::en_passant(E5, D6)));
    }

    #[test]
    fn test_en_passant_exposing_king_is_illegal() {
        // Both pawns leave the fifth rank, opening it for the rook.
        let mut position = position("4k3/3p4/8/K3P2r/8/8/8/8", Side::Black);
        position.make_move(Move::new(D7, D5, Piece::Pawn));

        let moves = legal_moves(&mut position);
        assert!(!moves.iter().any(|mve| mve.en_passant));
    }

    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R", Side::White, &[(E1, G1), (E1, C1)], &[] ; "both sides free")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K1NR", Side::White, &[(E1, C1)], &[(E1, G1)] ; "king side blocked")]
    #[test_case("r3k2r/8/8/8/8/8/8/RN2K2R", Side::White, &[(E1, G1)], &[(E1, C1)] ; "b file blocks queen side")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R", Side::Black, &[(E8, G8), (E8, C8)], &[] ; "black both sides")]
    #[test_case("r3k2r/8/8/8/8/8/4r3/R3K2R", Side::White, &[], &[(E1, G1), (E1, C1)] ; "in check")]
    #[test_case("r3k2r/8/8/8/8/8/5r2/R3K2R", Side::White, &[(E1, C1)], &[(E1, G1)] ; "transit square attacked")]
    #[test_case("r3k2r/8/8/8/8/8/1r6/R3K2R", Side::White, &[(E1, G1), (E1, C1)], &[] ; "b1 attacked is fine")]
    #[test_case("r3k2r/8/8/8/8/8/6r1/R3K2R", Side::White, &[(E1, C1)], &[(E1, G1)] ; "destination attacked")]
    fn test_castling(placement: &str, side: Side, want: &[(Square, Square)], dont_want: &[(Square, Square)]) {
        let mut position = position(placement, side);
        let moves = legal_moves(&mut position);

        for &(src, dest) in want {
            assert!(has_move(&moves, src, dest), "missing castle {}{}", src, dest);
        }
        for &(src, dest) in dont_want {
            assert!(!has_move(&moves, src, dest), "unexpected castle {}{}", src, dest);
        }
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let mut position = position("4k3/4r3/8/8/8/8/4N3/4K3", Side::White);
        let moves = legal_moves(&mut position);

        assert!(!moves.iter().any(|mve| mve.src == E2));
    }

    #[test]
    fn test_gives_check() {
        let mut position = position("4k3/8/8/8/8/8/8/R3K3", Side::White);

        assert!(gives_check(&mut position, Move::new(A1, A8, Piece::Rook)));
        assert!(!gives_check(&mut position, Move::new(A1, A7, Piece::Rook)));
        assert_eq!(position, self::position("4k3/8/8/8/8/8/8/R3K3", Side::White));
    }

    #[test_case("k7/1Q6/1K6/8/8/8/8/8", Side::Black, false ; "checkmated")]
    #[test_case("k7/8/1Q6/8/8/8/8/7K", Side::Black, false ; "stalemated")]
    #[test_case("k7/8/8/8/8/8/8/7K", Side::Black, true ; "free king")]
    fn test_has_legal_move(placement: &str, side: Side, want: bool) {
        assert_eq!(has_legal_move(&mut position(placement, side)), want);
    }
}
