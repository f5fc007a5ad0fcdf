//! Search configuration.
//!
//! A single typed, immutable struct built once and passed by reference
//! into the search. Tuning knobs live here instead of scattered globals
//! so two searches with the same config are directly comparable.

use crate::score::Cp;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SearchConfig {
    /// Enable null-move pruning.
    pub null_move_pruning: bool,
    /// Minimum remaining depth for a null-move attempt.
    pub null_move_min_depth: u8,

    /// Enable late-move reductions for quiet moves.
    pub late_move_reduction: bool,
    /// Minimum remaining depth for a reduction.
    pub lmr_min_depth: u8,
    /// Ordered moves before this index are never reduced.
    pub lmr_threshold: usize,

    /// Iteration depth from which aspiration windows are used.
    pub aspiration_min_depth: u8,
    /// Half-width of the aspiration window around the previous score.
    pub aspiration_width: Cp,

    /// Hard ceiling on quiescence recursion depth.
    pub max_q_ply: u8,
    /// Quiescence plies in which checking moves are generated.
    pub q_check_plies: u8,
    /// Delta-pruning margin added to a capture's plausible gain.
    pub delta_margin: Cp,

    /// Draw score from the engine's perspective. Negative values make the
    /// engine avoid draws.
    pub contempt: Cp,

    /// Nodes between deadline polls inside the recursion.
    pub stop_check_interval: u64,
}

impl SearchConfig {
    pub const fn new() -> Self {
        Self {
            null_move_pruning: true,
            null_move_min_depth: 3,
            late_move_reduction: true,
            lmr_min_depth: 3,
            lmr_threshold: 4,
            aspiration_min_depth: 4,
            aspiration_width: Cp(50),
            max_q_ply: 16,
            q_check_plies: 2,
            delta_margin: Cp(200),
            contempt: Cp(0),
            stop_check_interval: 2048,
        }
    }

    /// Returns a config with all speculative pruning disabled. Slower but
    /// useful for verifying that pruning never changes a forced result.
    pub const fn unpruned() -> Self {
        Self {
            null_move_pruning: false,
            late_move_reduction: false,
            ..Self::new()
        }
    }

    pub const fn with_contempt(mut self, contempt: Cp) -> Self {
        self.contempt = contempt;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new()
    }
}
