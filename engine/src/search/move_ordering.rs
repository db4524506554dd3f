use std::cmp::Reverse;

use crate::evaluation::piece_value;
use crate::move_gen::MoveList;
use crate::position::Move;
use crate::search::MAX_PLY;

const TT_MOVE_KEY: i32 = i32::MAX;
const CAPTURE_KEY_BASE: i32 = 1_000_000;
const PROMOTION_KEY_BASE: i32 = 900_000;
const KILLER_KEYS: [i32; 2] = [500_000, 400_000];

/// Up to two quiet moves per ply that caused a beta cutoff in a sibling.
#[derive(Debug, Clone)]
pub(crate) struct KillerTable {
    slots: Vec<[Option<Move>; 2]>,
}

impl KillerTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: vec![[None, None]; MAX_PLY as usize + 1],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = [None, None]);
    }

    pub(crate) fn get(&self, ply: u8) -> [Option<Move>; 2] {
        self.slots.get(ply as usize).copied().unwrap_or([None, None])
    }

    /// Newest killer goes in the first slot, the previous first slot moves down.
    pub(crate) fn record(&mut self, ply: u8, mve: Move) {
        let Some(slot) = self.slots.get_mut(ply as usize) else {
            return;
        };
        if slot[0].is_some_and(|killer| killer.same_squares(&mve)) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mve);
    }
}

/// Stable, descending: table move, then captures by MVV-LVA, then quiet
/// promotions, then the two killers, then everything else in generation order.
pub(crate) fn order_moves(moves: &mut MoveList, maybe_tt_best_move: Option<Move>, killers: [Option<Move>; 2]) {
    moves.sort_by_key(|&mve| Reverse(get_move_sort_key(mve, maybe_tt_best_move, killers)));
}

fn get_move_sort_key(mve: Move, maybe_tt_best_move: Option<Move>, killers: [Option<Move>; 2]) -> i32 {
    if maybe_tt_best_move == Some(mve) {
        return TT_MOVE_KEY;
    }

    let promotion_value = mve.promotion.map_or(0, piece_value);

    if mve.is_capture() {
        return CAPTURE_KEY_BASE + get_mvv_lva_value(mve) + promotion_value;
    }

    if mve.promotion.is_some() {
        return PROMOTION_KEY_BASE + promotion_value;
    }

    for (killer, key) in killers.iter().zip(KILLER_KEYS) {
        if killer.is_some_and(|killer| killer.same_squares(&mve)) {
            return key;
        }
    }

    0
}

/// Victim value minus attacker value.
pub(crate) fn get_mvv_lva_value(mve: Move) -> i32 {
    match mve.captured {
        Some(captured) => piece_value(captured) - piece_value(mve.piece),
        None => 0,
    }
}
