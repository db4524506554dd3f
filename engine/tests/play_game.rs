use pox_engine::Square::{self, *};
use pox_engine::{legal_moves, parse_placement, pseudo_moves, to_placement, Move, Piece, PlacedPiece, Position, Side};

use test_case::test_case;
use testresult::TestResult;

fn find_move(position: &mut Position, src: Square, dest: Square, promotion: Option<Piece>) -> Option<Move> {
    legal_moves(position)
        .into_iter()
        .find(|mve| mve.src == src && mve.dest == dest && mve.promotion == promotion)
}

fn placement_of(position: &Position) -> String {
    let pieces: Vec<PlacedPiece> = position
        .pieces()
        .map(|(square, piece, side)| PlacedPiece::new(piece, side, square))
        .collect();
    to_placement(&pieces)
}

#[test_case(vec![
    (D2, D4),
    (D7, D5),
    (C2, C4),
    (D5, C4),
    (E2, E3),
    (B7, B5),
    (A2, A4),
    (C7, C6),
    (A4, B5),
    (C6, B5),
    (D1, F3),
    (B8, C6),
    (F3, C6),
    (C8, D7),
], "r2qkbnr/p2bpppp/2Q5/1p6/2pP4/4P3/1P3PPP/RNB1KBNR", Side::White ; "normal")]
#[test_case(vec![
    (E2, E4),
    (E7, E5),
    (G1, F3),
    (B8, C6),
    (F1, B5),
    (A7, A6),
    (B5, A4),
    (F8, E7),
    (E1, G1),
], "r1bqk1nr/1pppbppp/p1n5/4p3/B3P3/5N2/PPPP1PPP/RNBQ1RK1", Side::Black ; "castling")]
#[test_case(vec![
    (E2, E4),
    (E7, E5),
    (D1, H5),
    (B8, C6),
    (F1, C4),
    (G8, F6),
    (H5, F7),
], "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR", Side::Black ; "scholars mate")]
fn test_play_game(moves: Vec<(Square, Square)>, want_placement: &str, want_to_move: Side) -> TestResult {
    let mut position = Position::start();
    for (src, dest) in moves {
        let mve = find_move(&mut position, src, dest, None).ok_or(format!("{} -> {} is not legal", src, dest))?;
        position.make_move(mve);
    }

    assert_eq!(placement_of(&position), want_placement);
    assert_eq!(position.to_move(), want_to_move);

    // Every move unwinds back to the start
    while position.unmake_move().is_some() {}
    assert_eq!(position, Position::start());
    Ok(())
}

#[test]
fn test_promotion_game() -> TestResult {
    let mut position = Position::start();
    let moves = [
        (D2, D4, None),
        (E7, E5, None),
        (D4, D5, None),
        (E5, E4, None),
        (D5, D6, None),
        (E4, E3, None),
        (D6, C7, None),
        (E3, F2, None),
        (E1, F2, None),
        (D7, D5, None),
        (C7, D8, Some(Piece::Queen)),
    ];
    for (src, dest, promotion) in moves {
        let mve = find_move(&mut position, src, dest, promotion).ok_or(format!("{} -> {} is not legal", src, dest))?;
        position.make_move(mve);
    }

    assert_eq!(placement_of(&position), "rnbQkbnr/pp3ppp/8/3p4/8/8/PPP1PKPP/RNBQ1BNR");
    assert!(position.in_check(Side::Black));
    Ok(())
}

#[test]
fn test_en_passant_game() -> TestResult {
    let mut position = Position::start();
    for (src, dest) in [(E2, E4), (A7, A6), (E4, E5), (D7, D5)] {
        let mve = find_move(&mut position, src, dest, None).ok_or(format!("{} -> {} is not legal", src, dest))?;
        position.make_move(mve);
    }
    assert_eq!(position.state.en_passant_target, Some(D6));

    let en_passant = find_move(&mut position, E5, D6, None).ok_or("en passant missing")?;
    assert!(en_passant.en_passant);
    position.make_move(en_passant);

    assert_eq!(placement_of(&position), "rnbqkbnr/1pp1pppp/p2P4/8/8/8/PPPP1PPP/RNBQKBNR");
    assert_eq!(position.state.en_passant_target, None);
    Ok(())
}

#[test_case("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", Side::White ; "start")]
#[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R", Side::White ; "kiwipete white")]
#[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R", Side::Black ; "kiwipete black")]
#[test_case("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1", Side::White ; "promotions")]
#[test_case("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8", Side::White ; "rook endgame")]
fn test_make_unmake_round_trip(placement: &str, to_move: Side) -> TestResult {
    let mut position = Position::from_pieces(&parse_placement(placement)?, to_move)?;
    let before = position.clone();
    let key_before = position.position_key();

    for mve in pseudo_moves(&position, to_move, false) {
        position.make_move(mve);
        // One level deeper to cover en passant targets and lost rights.
        // Replies to a move that left the own king attacked could take it.
        let replies = if position.in_check(to_move) {
            Default::default()
        } else {
            pseudo_moves(&position, to_move.opposite(), false)
        };
        for reply in replies {
            let mid = position.clone();
            position.make_move(reply);
            assert_eq!(position.unmake_move(), Some(reply));
            assert_eq!(position, mid, "after {} {}", mve, reply);
        }
        assert_eq!(position.unmake_move(), Some(mve));

        assert_eq!(position, before, "after {}", mve);
        assert_eq!(position.position_key(), key_before, "after {}", mve);
        assert_eq!(position.state, before.state);
    }

    assert_eq!(position.unmake_move(), None);
    assert_eq!(position, before);
    Ok(())
}
