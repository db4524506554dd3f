use crate::evaluation::Eval;
use crate::position::{Move, PositionKey};

pub const DEFAULT_TRANSPOSITION_TABLE_ENTRIES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalType {
    Exact,
    LowerBound,
    UpperBound,
}

#[derive(Debug, Clone, Copy)]
pub struct TranspositionTableEntry {
    key: PositionKey,
    /// Mate scores are stored relative to this node, not to the root.
    eval: Eval,
    eval_type: EvalType,
    best_move: Option<Move>,
    depth: u8,
}

impl TranspositionTableEntry {
    pub fn best_move(&self) -> Option<Move> {
        self.best_move
    }

    /// Stored score seen from `ply` half moves below the root.
    pub fn eval_at_ply(&self, ply: u8) -> Eval {
        from_tt(self.eval, ply)
    }
}

/// Outcome of a probe: a score usable as-is under the current bounds, and the
/// remembered best move for ordering either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probe {
    pub cutoff: Option<Eval>,
    pub best_move: Option<Move>,
}

/// Fixed size, depth-preferred table. Slots hold the full key, so an entry is
/// only ever returned for the position it was stored for.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<TranspositionTableEntry>>,
    probes: u64,
    hits: u64,
}

impl TranspositionTable {
    /// `num_entries` is rounded up to a power of two.
    pub fn with_entries(num_entries: usize) -> Self {
        Self {
            entries: vec![None; num_entries.max(1).next_power_of_two()],
            probes: 0,
            hits: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &PositionKey) -> Option<&TranspositionTableEntry> {
        self.entries[self.index(key)]
            .as_ref()
            .filter(|entry| entry.key == *key)
    }

    /// Applies the reuse rule: the stored search must be at least `depth`
    /// deep, exact scores are always usable, lower bounds only at or above
    /// `beta`, upper bounds only at or below `alpha`.
    pub fn probe(&mut self, key: &PositionKey, depth: u8, alpha: Eval, beta: Eval, ply: u8) -> Probe {
        self.probes += 1;
        let Some(entry) = self.get(key).copied() else {
            return Probe::default();
        };
        self.hits += 1;

        let mut probe = Probe {
            cutoff: None,
            best_move: entry.best_move,
        };
        if entry.depth >= depth {
            let eval = entry.eval_at_ply(ply);
            let usable = match entry.eval_type {
                EvalType::Exact => true,
                EvalType::LowerBound => eval >= beta,
                EvalType::UpperBound => eval <= alpha,
            };
            if usable {
                probe.cutoff = Some(eval);
            }
        }
        probe
    }

    /// Replaces the slot when it is empty, holds the same position, or holds
    /// a shallower search.
    pub fn store(
        &mut self,
        key: PositionKey,
        eval: Eval,
        eval_type: EvalType,
        best_move: Option<Move>,
        depth: u8,
        ply: u8,
    ) {
        let idx = self.index(&key);
        if let Some(existing) = &self.entries[idx] {
            if existing.key != key && existing.depth > depth {
                return;
            }
        }
        self.entries[idx] = Some(TranspositionTableEntry {
            key,
            eval: to_tt(eval, ply),
            eval_type,
            best_move,
            depth,
        });
    }

    pub fn hitrate(&self) -> f64 {
        if self.probes == 0 {
            return 0.0;
        }
        self.hits as f64 / self.probes as f64
    }

    /// Permille of slots in use.
    pub fn hashfull(&self) -> usize {
        let used = self.entries.iter().filter(|entry| entry.is_some()).count();
        used * 1000 / self.entries.len()
    }

    fn index(&self, key: &PositionKey) -> usize {
        (key.bucket_hash() as usize) & (self.entries.len() - 1)
    }
}

fn to_tt(eval: Eval, ply: u8) -> Eval {
    if eval > Eval::MATE_THRESHOLD {
        eval + ply as i32
    } else if eval < -Eval::MATE_THRESHOLD {
        eval - ply as i32
    } else {
        eval
    }
}

fn from_tt(eval: Eval, ply: u8) -> Eval {
    if eval > Eval::MATE_THRESHOLD {
        eval - ply as i32
    } else if eval < -Eval::MATE_THRESHOLD {
        eval + ply as i32
    } else {
        eval
    }
}
