use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use tabled::{Table, Tabled};

use crate::move_gen;
use crate::position::{Move, Position};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Tabled)]
pub struct PerftDepthResult {
    pub tot: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftDepthResult {
    fn add(&mut self, other: &PerftDepthResult) {
        self.tot += other.tot;
        self.captures += other.captures;
        self.en_passants += other.en_passants;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
        self.checkmates += other.checkmates;
    }

    pub fn new(
        tot: u64,
        captures: u64,
        en_passants: u64,
        castles: u64,
        promotions: u64,
        checks: u64,
        checkmates: u64,
    ) -> Self {
        PerftDepthResult {
            tot,
            captures,
            en_passants,
            castles,
            promotions,
            checks,
            checkmates,
        }
    }
}

pub struct PerftResult {
    pub depth_results: Vec<PerftDepthResult>,
    pub tot_nodes: u64,
    pub time_elapsed: Duration,
    pub nodes_per_second: f64,
}

impl Display for PerftResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total nodes: {}", self.tot_nodes)?;
        writeln!(f, "time elapsed: {}", self.time_elapsed.as_secs_f32())?;
        writeln!(f, "nodes/s: {:.0}", self.nodes_per_second)?;
        writeln!(f, "{}", Table::new(&self.depth_results))?;
        Ok(())
    }
}

/// Number of legal move sequences of length `depth`.
pub fn perft(position: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = move_gen::legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mve in moves {
        position.make_move(mve);
        nodes += perft(position, depth - 1);
        position.undo();
    }
    nodes
}

/// Perft count below each legal root move, in generation order.
pub fn perft_divide(position: &mut Position, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return vec![];
    }
    move_gen::legal_moves(position)
        .into_iter()
        .map(|mve| {
            position.make_move(mve);
            let nodes = perft(position, depth - 1);
            position.undo();
            (mve, nodes)
        })
        .collect()
}

/// Walks every line up to `depth` plies and tallies each ply separately.
/// Checkmates are credited to the ply whose move delivered them.
pub fn perft_full(position: &Position, depth: usize) -> PerftResult {
    let mut depth_results = vec![PerftDepthResult::default(); depth];
    let mut position = position.clone();

    let start = Instant::now();
    perft_helper(&mut depth_results, &mut position, depth, 0);
    let time_elapsed = start.elapsed();

    let tot_nodes = depth_results.iter().fold(0, |tot, curr| tot + curr.tot);
    let nodes_per_second = tot_nodes as f64 / time_elapsed.as_secs_f64().max(f64::EPSILON);

    PerftResult {
        depth_results,
        tot_nodes,
        time_elapsed,
        nodes_per_second,
    }
}

fn perft_helper(depth_results: &mut [PerftDepthResult], position: &mut Position, max_depth: usize, curr_depth: usize) {
    // Moves are needed even at the last ply to spot checkmates
    let moves = move_gen::legal_moves(position);
    let side = position.to_move();

    if moves.is_empty() {
        if curr_depth > 0 && position.in_check(side) {
            depth_results[curr_depth - 1].checkmates += 1;
        }
        return;
    }
    if curr_depth == max_depth {
        return;
    }

    let mut curr_res = PerftDepthResult {
        tot: moves.len() as u64,
        ..PerftDepthResult::default()
    };

    for mve in moves {
        if mve.is_capture() {
            curr_res.captures += 1;
        }
        if mve.en_passant {
            curr_res.en_passants += 1;
        }
        if mve.castle.is_some() {
            curr_res.castles += 1;
        }
        if mve.promotion.is_some() {
            curr_res.promotions += 1;
        }

        position.make_move(mve);
        if position.in_check(side.opposite()) {
            curr_res.checks += 1;
        }
        perft_helper(depth_results, position, max_depth, curr_depth + 1);
        position.undo();
    }

    depth_results[curr_depth].add(&curr_res);
}
