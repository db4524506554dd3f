use std::fmt::Display;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use crate::evaluation::{piece_value, Eval, EvaluatePosition, PositionEvaluator};
use crate::move_gen::{self, MoveList};
use crate::position::{Move, Position};
use crate::search::move_ordering::{order_moves, KillerTable};
use crate::transposition_table::{EvalType, TranspositionTable, DEFAULT_TRANSPOSITION_TABLE_ENTRIES};

mod move_ordering;

/// Hard limit on distance from the root, check extensions included.
pub const MAX_PLY: u8 = 128;

/// Knobs for the single search implementation. Each pruning or extension
/// strategy can be tuned or switched off here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    pub max_depth: u8,
    /// Wall clock budget, `None` searches until `max_depth` completes.
    pub move_time: Option<Duration>,
    /// Visited nodes between two looks at the clock.
    pub node_check_interval: u64,
    pub tt_entries: usize,
    pub late_move_reduction: bool,
    /// Longest capture sequence followed past the horizon, `None` is unbounded.
    pub quiescence_max_depth: Option<u8>,
    /// Also try quiet checking moves on the first quiescence ply.
    pub quiescence_checks: bool,
    /// Delta pruning margin, `None` disables delta pruning.
    pub delta_margin: Option<i32>,
    /// No check extension is granted at or beyond this ply.
    pub check_extension_ply_limit: u8,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: 7,
            move_time: Some(Duration::from_millis(3000)),
            node_check_interval: 2048,
            tt_entries: DEFAULT_TRANSPOSITION_TABLE_ENTRIES,
            late_move_reduction: true,
            quiescence_max_depth: Some(8),
            quiescence_checks: false,
            delta_margin: Some(200),
            check_extension_ply_limit: 32,
        }
    }
}

impl Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Print out only non default fields
        let default = SearchParams::default();
        let mut parts = vec![];

        if self.max_depth != default.max_depth {
            parts.push(format!("max_depth: {}", self.max_depth));
        }
        if self.move_time != default.move_time {
            parts.push(format!("move_time: {:?}", self.move_time));
        }
        if self.node_check_interval != default.node_check_interval {
            parts.push(format!("node_check_interval: {}", self.node_check_interval));
        }
        if self.tt_entries != default.tt_entries {
            parts.push(format!("tt_entries: {}", self.tt_entries));
        }
        if self.late_move_reduction != default.late_move_reduction {
            parts.push(format!("late_move_reduction: {}", self.late_move_reduction));
        }
        if self.quiescence_max_depth != default.quiescence_max_depth {
            parts.push(format!("quiescence_max_depth: {:?}", self.quiescence_max_depth));
        }
        if self.quiescence_checks != default.quiescence_checks {
            parts.push(format!("quiescence_checks: {}", self.quiescence_checks));
        }
        if self.delta_margin != default.delta_margin {
            parts.push(format!("delta_margin: {:?}", self.delta_margin));
        }
        if self.check_extension_ply_limit != default.check_extension_ply_limit {
            parts.push(format!("check_extension_ply_limit: {}", self.check_extension_ply_limit));
        }
        write!(f, "SearchParams: {}", parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoMoveReason {
    Checkmate,
    Stalemate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// `depth` is the last fully searched depth, 0 when only the fallback
    /// move could be produced.
    BestMove { mve: Move, eval: Eval, depth: u8 },
    NoMove(NoMoveReason),
}

impl SearchOutcome {
    pub fn best_move(&self) -> Option<Move> {
        match self {
            SearchOutcome::BestMove { mve, .. } => Some(*mve),
            SearchOutcome::NoMove(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResultInfo {
    pub nodes: u64,
    pub seldepth: u8,
    pub time_elapsed: Duration,
    pub timed_out: bool,
    pub tt_hitrate: f64,
}

/// Searches `position` for its side to move with fresh search state.
pub fn search(
    position: &Position,
    params: &SearchParams,
    position_eval: impl EvaluatePosition,
) -> (SearchOutcome, SearchResultInfo) {
    Searcher::new(position.clone(), params.clone(), position_eval).search()
}

/// All mutable state of one search: the position being walked, the
/// transposition and killer tables, and the node and time bookkeeping.
/// Nothing here is shared between two searches.
pub struct Searcher<E: EvaluatePosition = PositionEvaluator> {
    position: Position,
    params: SearchParams,
    position_eval: E,
    transposition_table: TranspositionTable,
    killers: KillerTable,
    nodes: u64,
    seldepth: u8,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<E: EvaluatePosition> Searcher<E> {
    pub fn new(position: Position, params: SearchParams, position_eval: E) -> Self {
        let transposition_table = TranspositionTable::with_entries(params.tt_entries);
        Self {
            position,
            params,
            position_eval,
            transposition_table,
            killers: KillerTable::new(),
            nodes: 0,
            seldepth: 0,
            deadline: None,
            timed_out: false,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.transposition_table
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Iterative deepening from depth 1 to `max_depth`. The result of the
    /// last completed depth is kept when the time budget runs out.
    pub fn search(&mut self) -> (SearchOutcome, SearchResultInfo) {
        let side = self.position.to_move();
        let _span = debug_span!("search", side = %side, params = %self.params).entered();

        let start = Instant::now();
        self.deadline = self.params.move_time.map(|move_time| start + move_time);
        self.timed_out = false;
        self.nodes = 0;
        self.seldepth = 0;
        let start_ply_count = self.position.ply_count();
        debug!("Transposition table with {} slots", self.transposition_table.capacity());

        let outcome = if move_gen::has_legal_move(&mut self.position) {
            self.iterative_deepening(start)
        } else if self.position.in_check(side) {
            info!("{} is checkmated", side);
            SearchOutcome::NoMove(NoMoveReason::Checkmate)
        } else {
            info!("{} is stalemated", side);
            SearchOutcome::NoMove(NoMoveReason::Stalemate)
        };

        debug_assert_eq!(self.position.ply_count(), start_ply_count);

        let info = SearchResultInfo {
            nodes: self.nodes,
            seldepth: self.seldepth,
            time_elapsed: start.elapsed(),
            timed_out: self.timed_out,
            tt_hitrate: self.transposition_table.hitrate(),
        };
        (outcome, info)
    }

    fn iterative_deepening(&mut self, start: Instant) -> SearchOutcome {
        let mut best: Option<(Move, Eval, u8)> = None;

        'deepening: for depth in 1..=self.params.max_depth.max(1) {
            self.killers.clear();

            let root_key = self.position.position_key();
            let maybe_tt_best_move = self
                .transposition_table
                .get(&root_key)
                .and_then(|entry| entry.best_move());

            let mut moves = move_gen::legal_moves(&mut self.position);
            order_moves(&mut moves, maybe_tt_best_move, self.killers.get(0));

            let mut alpha = Eval::MIN;
            let beta = Eval::MAX;
            let mut depth_best: Option<(Move, Eval)> = None;

            for mve in moves {
                self.position.make_move(mve);
                let maybe_eval = self.negamax(depth - 1, -beta, -alpha, 1).map(Eval::flip);
                self.position.undo();

                let Some(eval) = maybe_eval else {
                    info!("Time limit reached during depth {}, nodes {}", depth, self.nodes);
                    break 'deepening;
                };

                if depth_best.map_or(true, |(_, best_eval)| eval > best_eval) {
                    depth_best = Some((mve, eval));
                }
                if eval > alpha {
                    alpha = eval;
                }
            }

            let Some((mve, eval)) = depth_best else {
                break;
            };
            best = Some((mve, eval, depth));
            self.transposition_table
                .store(root_key, eval, EvalType::Exact, Some(mve), depth, 0);
            self.write_search_info(depth, &start, eval, mve);

            if eval > Eval::MATE_THRESHOLD {
                info!("Mate found at depth {}: {}", depth, eval);
                break;
            }
        }

        match best {
            Some((mve, eval, depth)) => {
                info!("Best move {} ({}) at depth {}", mve, eval, depth);
                SearchOutcome::BestMove { mve, eval, depth }
            }
            None => self.fallback_move(),
        }
    }

    /// First pseudo-legal move that keeps the king safe, used when not even
    /// depth 1 finished in time.
    fn fallback_move(&mut self) -> SearchOutcome {
        let side = self.position.to_move();
        let maybe_move = move_gen::pseudo_moves(&self.position, side, false)
            .into_iter()
            .find(|&mve| move_gen::is_legal(&mut self.position, mve));

        match maybe_move {
            Some(mve) => {
                info!("No depth completed, falling back to {}", mve);
                SearchOutcome::BestMove {
                    mve,
                    eval: self.position_eval.evaluate(&self.position),
                    depth: 0,
                }
            }
            None if self.position.in_check(side) => SearchOutcome::NoMove(NoMoveReason::Checkmate),
            None => SearchOutcome::NoMove(NoMoveReason::Stalemate),
        }
    }

    /// Counts a visited node and polls the clock every `node_check_interval`
    /// nodes. Returns true once the budget is spent.
    fn out_of_time(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        self.nodes += 1;
        if self.nodes % self.params.node_check_interval.max(1) == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    debug!("Search exceeded its time budget after {} nodes", self.nodes);
                    self.timed_out = true;
                }
            }
        }
        self.timed_out
    }

    /// Fail-soft alpha-beta. Returns `None` when the search ran out of time,
    /// every caller then unwinds without using the value.
    pub fn negamax(&mut self, depth: u8, mut alpha: Eval, mut beta: Eval, ply: u8) -> Option<Eval> {
        if self.out_of_time() {
            return None;
        }
        self.seldepth = self.seldepth.max(ply);

        // No mate can be quicker than the current distance from the root.
        alpha = alpha.max(Eval::mated_in(ply));
        beta = beta.min(Eval::mate_in(ply.saturating_add(1)));
        if alpha >= beta {
            return Some(alpha);
        }

        let key = self.position.position_key();
        let probe = self
            .transposition_table
            .probe(&key, depth, alpha, beta, ply);
        if let Some(eval) = probe.cutoff {
            return Some(eval);
        }

        let side = self.position.to_move();
        let in_check = self.position.in_check(side);
        let mut remaining = depth;
        if in_check && ply < self.params.check_extension_ply_limit {
            remaining += 1;
        }

        if remaining == 0 || ply >= MAX_PLY {
            return self.quiescence(alpha, beta, ply);
        }

        let mut moves = move_gen::pseudo_moves(&self.position, side, false);
        order_moves(&mut moves, probe.best_move, self.killers.get(ply));

        let original_alpha = alpha;
        let mut best_eval = Eval::MIN;
        let mut best_move = None;
        let mut legal_moves = 0;

        for mve in moves {
            self.position.make_move(mve);
            if self.position.in_check(side) {
                self.position.undo();
                continue;
            }
            legal_moves += 1;

            let reduce = self.params.late_move_reduction
                && legal_moves > 3
                && remaining >= 3
                && !in_check
                && !mve.is_capture()
                && mve.promotion.is_none()
                && mve.castle.is_none();

            let maybe_eval = if reduce {
                match self
                    .negamax(remaining - 2, -(alpha + 1), -alpha, ply + 1)
                    .map(Eval::flip)
                {
                    Some(reduced_eval) if reduced_eval > alpha => self
                        .negamax(remaining - 1, -beta, -alpha, ply + 1)
                        .map(Eval::flip),
                    other => other,
                }
            } else {
                self.negamax(remaining - 1, -beta, -alpha, ply + 1)
                    .map(Eval::flip)
            };

            self.position.undo();
            // Reason for `?`: if the child node is signaling search is terminated,
            // better terminate self.
            let eval = maybe_eval?;

            if eval > best_eval {
                best_eval = eval;
                best_move = Some(mve);
            }
            if eval > alpha {
                alpha = eval;
            }
            if alpha >= beta {
                if !mve.is_capture() {
                    self.killers.record(ply, mve);
                }
                break;
            }
        }

        if legal_moves == 0 {
            return Some(if in_check { Eval::mated_in(ply) } else { Eval::DRAW });
        }

        let eval_type = if best_eval >= beta {
            EvalType::LowerBound
        } else if best_eval <= original_alpha {
            EvalType::UpperBound
        } else {
            EvalType::Exact
        };
        self.transposition_table
            .store(key, best_eval, eval_type, best_move, depth, ply);

        Some(best_eval)
    }

    /// Source: https://www.chessprogramming.org/Quiescence_Search
    pub fn quiescence(&mut self, alpha: Eval, beta: Eval, ply: u8) -> Option<Eval> {
        self.quiescence_helper(alpha, beta, ply, 0)
    }

    fn quiescence_helper(&mut self, mut alpha: Eval, beta: Eval, ply: u8, qdepth: u8) -> Option<Eval> {
        if self.out_of_time() {
            return None;
        }
        self.seldepth = self.seldepth.max(ply);

        let standing_pat = self.position_eval.evaluate(&self.position);
        if standing_pat >= beta {
            return Some(standing_pat);
        }
        if standing_pat > alpha {
            alpha = standing_pat;
        }
        if ply >= MAX_PLY
            || self
                .params
                .quiescence_max_depth
                .is_some_and(|max_depth| qdepth >= max_depth)
        {
            return Some(standing_pat);
        }

        let side = self.position.to_move();
        let mut moves = if self.params.quiescence_checks && qdepth == 0 {
            let position = &mut self.position;
            move_gen::pseudo_moves(position, side, false)
                .into_iter()
                .filter(|&mve| mve.is_capture() || move_gen::gives_check(position, mve))
                .collect::<MoveList>()
        } else {
            move_gen::pseudo_moves(&self.position, side, true)
        };
        order_moves(&mut moves, None, [None, None]);

        let mut best_eval = standing_pat;
        for mve in moves {
            if let (Some(margin), Some(captured), None) = (self.params.delta_margin, mve.captured, mve.promotion) {
                if standing_pat + piece_value(captured) + margin < alpha {
                    continue;
                }
            }

            self.position.make_move(mve);
            // Captures are only pseudo-legal, the capturing side may have
            // walked into check.
            if self.position.in_check(side) {
                self.position.undo();
                continue;
            }
            let maybe_eval = self
                .quiescence_helper(-beta, -alpha, ply + 1, qdepth + 1)
                .map(Eval::flip);
            self.position.undo();
            let eval = maybe_eval?;

            if eval > best_eval {
                best_eval = eval;
            }
            if eval > alpha {
                alpha = eval;
            }
            if alpha >= beta {
                break;
            }
        }

        Some(best_eval)
    }

    fn write_search_info(&self, depth: u8, start_time: &Instant, eval: Eval, best_move: Move) {
        let nps = self.nodes as f32 / start_time.elapsed().as_secs_f32().max(f32::EPSILON);
        debug!(
            "info depth {} seldepth {} score {} nodes {} nps {:.0} hashfull {} tthitrate {:.2} time {} pv {}",
            depth,
            self.seldepth,
            eval,
            self.nodes,
            nps,
            self.transposition_table.hashfull(),
            self.transposition_table.hitrate(),
            start_time.elapsed().as_millis(),
            best_move,
        );
    }
}
