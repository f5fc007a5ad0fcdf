//! Transposition table.
//!
//! A capacity-bounded cache of previously searched positions keyed by the
//! board model's Zobrist hash. Entries survive across searches within a
//! game; [`TranspositionTable::new_search`] bumps a generation counter so
//! the replacement policy can age out entries from old searches.
//!
//! Mate scores are stored relative to the node that produced them and
//! rebased to the retrieval ply on probe, so one stored entry is valid at
//! whatever ply the position is rediscovered. `store` and `probe` apply
//! the two halves of that adjustment; callers never rebase themselves.

use std::collections::HashMap;
use std::mem;

use chess::ChessMove;

use crate::score::Cp;

/// The kind of bound a stored score represents.
/// See [Node Types](https://www.chessprogramming.org/Node_Types).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Bound {
    /// Score was inside the (alpha, beta) window: exact.
    Exact,
    /// Score caused a beta cutoff: true value is at least this.
    Lower,
    /// No move improved alpha: true value is at most this.
    Upper,
}

/// A previously searched position. Kept small and `Copy` so per-slot
/// atomic packing stays possible if the search is ever parallelized.
#[derive(Debug, Copy, Clone)]
pub struct Entry {
    pub depth: u8,
    pub score: Cp,
    pub bound: Bound,
    pub best_move: Option<ChessMove>,
    generation: u32,
    accesses: u32,
}

/// The result of a successful probe, with the score already rebased to
/// the probing ply. `depth` must be checked against the caller's required
/// depth before the score is trusted as a cutoff.
#[derive(Debug, Copy, Clone)]
pub struct Probe {
    pub depth: u8,
    pub score: Cp,
    pub bound: Bound,
    pub best_move: Option<ChessMove>,
}

/// Entries from searches older than this many generations lose their
/// replacement protection.
const STALE_GENERATIONS: u32 = 2;

/// Fraction (1/N) of entries removed by an eviction sweep.
const EVICT_DIVISOR: usize = 10;

/// A transposition table with a fixed capacity derived from a megabyte
/// budget.
///
/// ```rust
/// use scout_engine::transposition::{Bound, TranspositionTable};
/// use scout_engine::score::Cp;
///
/// let mut tt = TranspositionTable::with_mb(1);
/// tt.store(42, 5, 0, Cp(17), Bound::Exact, None);
///
/// let probe = tt.probe(42, 0).unwrap();
/// assert_eq!(probe.score, Cp(17));
/// assert_eq!(probe.depth, 5);
/// ```
#[derive(Debug)]
pub struct TranspositionTable {
    entries: HashMap<u64, Entry>,
    capacity: usize,
    generation: u32,
}

/// Converts a size in megabytes to an entry capacity.
fn mb_to_capacity(mb: usize) -> usize {
    let slot = mem::size_of::<u64>() + mem::size_of::<Entry>();
    ((mb * 1_000_000) / slot).max(1)
}

impl TranspositionTable {
    pub const DEFAULT_MB: usize = 16;

    pub fn new() -> Self {
        Self::with_mb(Self::DEFAULT_MB)
    }

    pub fn with_mb(mb: usize) -> Self {
        Self::with_capacity(mb_to_capacity(mb.max(1)))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        // At least one slot, so load_factor never divides by zero.
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(1 << 20)),
            capacity,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill level in permille, as reported by `info hashfull`.
    pub fn load_factor(&self) -> usize {
        self.entries.len() * 1000 / self.capacity
    }

    /// Removes all entries and resets the generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = 0;
    }

    /// Drops the table and allocates a new one of size `new_mb`.
    /// Entries are not preserved. Returns the new capacity.
    pub fn set_mb(&mut self, new_mb: usize) -> usize {
        *self = Self::with_mb(new_mb);
        self.capacity
    }

    /// Marks the start of a new search. Entries written before the last
    /// few calls lose their depth-based replacement protection.
    pub fn new_search(&mut self) {
        self.generation += 1;
    }

    /// Store a search result for `hash`, observed at `ply` with `score`
    /// relative to the root.
    ///
    /// Replacement policy: an empty slot always stores. An occupied slot
    /// is replaced when the new entry searched at least as deep, or when
    /// the old entry is stale. At capacity, inserting a fresh key first
    /// evicts the lowest-value tenth of the table.
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        ply: usize,
        score: Cp,
        bound: Bound,
        best_move: Option<ChessMove>,
    ) {
        let entry = Entry {
            depth,
            score: score.to_tt(ply),
            bound,
            best_move,
            generation: self.generation,
            accesses: 0,
        };

        if let Some(existing) = self.entries.get_mut(&hash) {
            let stale = self.generation.saturating_sub(existing.generation) > STALE_GENERATIONS;
            if depth >= existing.depth || stale {
                *existing = entry;
            }
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.insert(hash, entry);
    }

    /// Look up `hash`, rebasing any mate score to `ply`. The caller must
    /// still verify `probe.depth` before treating the score as a cutoff.
    pub fn probe(&mut self, hash: u64, ply: usize) -> Option<Probe> {
        let entry = self.entries.get_mut(&hash)?;
        entry.accesses = entry.accesses.saturating_add(1);

        Some(Probe {
            depth: entry.depth,
            score: entry.score.from_tt(ply),
            bound: entry.bound,
            best_move: entry.best_move,
        })
    }

    /// Remove the lowest-value tenth of the table, ranked by a composite
    /// of depth, access count and age.
    fn evict(&mut self) {
        let generation = self.generation;
        let worth = |entry: &Entry| -> i64 {
            let age = generation.saturating_sub(entry.generation) as i64;
            entry.depth as i64 * 8 + entry.accesses as i64 * 4 - age * 16
        };

        let mut ranked: Vec<(u64, i64)> = self
            .entries
            .iter()
            .map(|(hash, entry)| (*hash, worth(entry)))
            .collect();
        ranked.sort_unstable_by_key(|(_, value)| *value);

        let victims = (self.entries.len() / EVICT_DIVISOR).max(1);
        for (hash, _) in ranked.into_iter().take(victims) {
            self.entries.remove(&hash);
        }
        log::debug!(
            "tt eviction sweep removed {} entries, {} remain",
            victims,
            self.entries.len()
        );
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
