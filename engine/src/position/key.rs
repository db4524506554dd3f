use std::fmt;

use crate::position::{Position, Side};

/// Exact, content-only encoding of a position: which kind of piece of which
/// colour stands on each square, side to move, castling rights and en passant
/// file. Two keys are equal iff the positions they were taken from are.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    squares: [u64; 4],
    meta: u16,
}

impl PositionKey {
    pub(crate) fn new(position: &Position) -> Self {
        let mut squares = [0u64; 4];
        for (square, piece, side) in position.pieces() {
            // 0 is an empty square, 1..=6 white pieces, 9..=14 black pieces
            let code = (piece.index() as u64 + 1) | ((side.index() as u64) << 3);
            let idx = square.index();
            squares[idx / 16] |= code << ((idx % 16) * 4);
        }

        let rights = &position.state.castling_rights;
        let mut meta = 0u16;
        if position.state.to_move == Side::Black {
            meta |= 1;
        }
        for (bit, &right) in [
            rights.white_king_side,
            rights.white_queen_side,
            rights.black_king_side,
            rights.black_queen_side,
        ]
        .iter()
        .enumerate()
        {
            if right {
                meta |= 1 << (bit + 1);
            }
        }
        if let Some(target) = position.state.en_passant_target {
            meta |= (target.file() as u16 + 1) << 5;
        }

        Self { squares, meta }
    }

    /// Well mixed 64 bit digest used to pick a table slot.
    pub(crate) fn bucket_hash(&self) -> u64 {
        let mut h = self.meta as u64 ^ 0x9E37_79B9_7F4A_7C15;
        for &word in &self.squares {
            h = mix(h ^ word);
        }
        mix(h)
    }
}

/// splitmix64 finaliser
const fn mix(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

impl fmt::Debug for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016x}{:016x}{:016x}{:016x}:{:03x}",
            self.squares[3], self.squares[2], self.squares[1], self.squares[0], self.meta
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::placement::parse_placement;
    use crate::position::{Move, Piece, Position, Side};
    use crate::square::Square::*;

    #[test]
    fn test_transposed_positions_share_key() {
        let mut a = Position::start();
        a.make_move(Move::new(G1, F3, Piece::Knight));
        a.make_move(Move::new(G8, F6, Piece::Knight));
        a.make_move(Move::new(B1, C3, Piece::Knight));

        let mut b = Position::start();
        b.make_move(Move::new(B1, C3, Piece::Knight));
        b.make_move(Move::new(G8, F6, Piece::Knight));
        b.make_move(Move::new(G1, F3, Piece::Knight));

        assert_eq!(a.position_key(), b.position_key());
    }

    #[test]
    fn test_side_to_move_changes_key() {
        let white = Position::start();
        let mut black = Position::start();
        black.set_to_move(Side::Black);

        assert_ne!(white.position_key(), black.position_key());
    }

    #[test]
    fn test_castling_rights_change_key() {
        // Rook went h1 -> g1 -> h1: same squares, right is gone.
        let mut moved = Position::from_pieces(&parse_placement("4k3/8/8/8/8/8/8/4K2R").unwrap(), Side::White).unwrap();
        moved.make_move(Move::new(H1, G1, Piece::Rook));
        moved.make_move(Move::new(E8, D8, Piece::King));
        moved.make_move(Move::new(G1, H1, Piece::Rook));
        moved.make_move(Move::new(D8, E8, Piece::King));

        let fresh = Position::from_pieces(&parse_placement("4k3/8/8/8/8/8/8/4K2R").unwrap(), Side::White).unwrap();

        assert_eq!(moved.to_string(), fresh.to_string());
        assert_ne!(moved.position_key(), fresh.position_key());
    }

    #[test]
    fn test_en_passant_file_changes_key() {
        let mut double_push = Position::start();
        double_push.make_move(Move::new(E2, E4, Piece::Pawn));

        let mut two_steps = Position::start();
        two_steps.make_move(Move::new(E2, E3, Piece::Pawn));
        two_steps.make_move(Move::new(G8, F6, Piece::Knight));
        two_steps.make_move(Move::new(E3, E4, Piece::Pawn));
        two_steps.make_move(Move::new(F6, G8, Piece::Knight));
        two_steps.set_to_move(Side::Black);

        assert_eq!(double_push.to_string(), two_steps.to_string());
        assert_eq!(double_push.to_move(), two_steps.to_move());
        assert_ne!(double_push.position_key(), two_steps.position_key());
    }
}
