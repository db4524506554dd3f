use pox_engine::Square::*;
use pox_engine::{parse_placement, perft, perft_divide, perft_full, Move, PerftDepthResult, Piece, Position, Side};

use test_case::test_case;
use testresult::TestResult;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1";

fn position(placement: &str, to_move: Side) -> Result<Position, Box<dyn std::error::Error>> {
    Ok(Position::from_pieces(&parse_placement(placement)?, to_move)?)
}

#[test_case(1, 20)]
#[test_case(2, 400)]
#[test_case(3, 8902)]
#[test_case(4, 197_281)]
fn test_perft_start(depth: u8, want: u64) {
    let mut position = Position::start();

    assert_eq!(perft(&mut position, depth), want);
    assert_eq!(position, Position::start());
}

#[test_case(KIWIPETE, 1, 48 ; "kiwipete 1")]
#[test_case(KIWIPETE, 2, 2039 ; "kiwipete 2")]
#[test_case(KIWIPETE, 3, 97_862 ; "kiwipete 3")]
#[test_case(POSITION_3, 1, 14 ; "position 3 depth 1")]
#[test_case(POSITION_3, 4, 43_238 ; "position 3 depth 4")]
#[test_case(POSITION_4, 1, 6 ; "position 4 depth 1")]
#[test_case(POSITION_4, 3, 9467 ; "position 4 depth 3")]
fn test_perft_known_positions(placement: &str, depth: u8, want: u64) -> TestResult {
    let mut position = position(placement, Side::White)?;
    let before = position.clone();

    assert_eq!(perft(&mut position, depth), want);
    assert_eq!(position, before);
    Ok(())
}

#[test_case(Position::start(), 4, PerftDepthResult::new(197_281, 1576, 0, 0, 0, 469, 8) ; "starting 4")]
#[test_case(position(KIWIPETE, Side::White).unwrap(), 3, PerftDepthResult::new(
    97_862,
    17_102,
    45,
    3162,
    0,
    993,
    1,
    ) ; "kiwipete 3"
)]
#[test_case(position(POSITION_3, Side::White).unwrap(), 4, PerftDepthResult::new(
    43_238,
    3348,
    123,
    0,
    0,
    1680,
    17,
    ) ; "position 3 depth 4"
)]
fn test_perft_full(starting_position: Position, depth: usize, want: PerftDepthResult) {
    let res = perft_full(&starting_position, depth);
    println!("{}", res);

    assert_eq!(res.depth_results.len(), depth);
    assert_eq!(res.depth_results.last(), Some(&want));
}

#[test]
fn test_perft_divide_start() {
    let mut position = Position::start();
    let divided = perft_divide(&mut position, 2);

    assert_eq!(divided.len(), 20);
    assert!(divided.iter().all(|&(_, nodes)| nodes == 20));
    assert!(divided.contains(&(Move::new(G1, F3, Piece::Knight), 20)));
}

#[test]
#[ignore]
fn test_perft_start_5() {
    assert_eq!(perft(&mut Position::start(), 5), 4_865_609);
}
