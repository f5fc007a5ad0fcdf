//! Time management.
//!
//! A search runs in one of four modes. Infinite searches until stopped,
//! Depth searches to a fixed depth, MoveTime spends a fixed time per
//! move, and Standard plays under a chess clock and has to decide for
//! itself how much of the remaining time one move deserves.

use std::time::{Duration, Instant};

use chess::{Board, Color, MoveGen};

use crate::error::{Error, Result};
use crate::score::MAX_PLY;
use crate::uci::SearchControls;

/// Expected amount of scheduling/IO time loss per move.
const OVERHEAD: Duration = Duration::from_millis(10);
/// Smallest budget a timed search is ever clamped to.
const MIN_BUDGET: Duration = Duration::from_millis(5);
/// Assumed game length when the clock gives no `movestogo`.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// Returns true if the duration since the start of search reaches `budget`.
pub fn is_out_of_time(start_time: Instant, budget: Duration) -> bool {
    start_time.elapsed() + OVERHEAD >= budget
}

/// The four supported search modes.
/// Infinite mode: do not stop searching; an external stop is required.
/// Standard mode: chess time controls with remaining time per side.
/// Depth mode: search to a given depth.
/// MoveTime mode: search for a specified time per move.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mode {
    Infinite,
    Standard(Standard),
    Depth(Depth),
    MoveTime(MoveTime),
}

impl Mode {
    pub fn infinite() -> Self {
        Self::Infinite
    }

    pub fn depth(depth: u8, movetime: Option<Duration>) -> Self {
        Self::Depth(Depth {
            depth: depth.max(1),
            movetime,
        })
    }

    pub fn movetime(movetime: Duration, depth: Option<u8>) -> Self {
        Self::MoveTime(MoveTime {
            movetime: movetime.max(MIN_BUDGET),
            depth,
        })
    }

    pub fn standard(
        wtime: Duration,
        btime: Duration,
        winc: Option<Duration>,
        binc: Option<Duration>,
        moves_to_go: Option<u32>,
        depth: Option<u8>,
    ) -> Self {
        Self::Standard(Standard {
            wtime,
            btime,
            winc,
            binc,
            moves_to_go,
            depth,
        })
    }

    /// The deepest iteration this mode allows. Degenerate requests are
    /// clamped to at least one ply.
    pub fn max_depth(&self) -> u8 {
        let limit = match self {
            Mode::Infinite => None,
            Mode::Standard(mode) => mode.depth,
            Mode::Depth(mode) => Some(mode.depth),
            Mode::MoveTime(mode) => mode.depth,
        };
        limit.unwrap_or(MAX_PLY as u8 - 1).clamp(1, MAX_PLY as u8 - 1)
    }

    /// The wall-clock budget for this search, if the mode has one.
    /// `complexity` scales a Standard allocation up for sharp positions
    /// and down for quiet ones.
    pub fn budget(&self, root_player: Color, complexity: f64) -> Option<Duration> {
        match self {
            Mode::Infinite => None,
            Mode::Depth(mode) => mode.movetime,
            Mode::MoveTime(mode) => Some(mode.movetime),
            Mode::Standard(mode) => Some(mode.allocate(root_player, complexity)),
        }
    }
}

impl TryFrom<SearchControls> for Mode {
    type Error = Error;
    fn try_from(controls: SearchControls) -> Result<Self> {
        if controls.infinite {
            Ok(Mode::Infinite)
        } else if let (Some(wtime), Some(btime)) = (controls.wtime, controls.btime) {
            Ok(Mode::standard(
                wtime,
                btime,
                controls.winc,
                controls.binc,
                controls.moves_to_go,
                controls.depth,
            ))
        } else if let Some(movetime) = controls.move_time {
            Ok(Mode::movetime(movetime, controls.depth))
        } else if let Some(depth) = controls.depth {
            Ok(Mode::depth(depth, None))
        } else {
            Err(Error::ModeNotSatisfied)
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Depth {
    pub depth: u8,
    movetime: Option<Duration>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MoveTime {
    movetime: Duration,
    depth: Option<u8>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Standard {
    wtime: Duration,
    btime: Duration,
    winc: Option<Duration>,
    binc: Option<Duration>,
    moves_to_go: Option<u32>,
    depth: Option<u8>,
}

impl Standard {
    /// Split the remaining clock into a budget for this move.
    ///
    /// A base slice of `remaining / movestogo` plus most of the increment
    /// is scaled by the root complexity factor and clamped to between
    /// 1/40 and 1/4 of the remaining time.
    fn allocate(&self, root_player: Color, complexity: f64) -> Duration {
        let (remaining, increment) = match root_player {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let increment = increment.unwrap_or(Duration::ZERO);
        let moves_to_go = self.moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);

        let base = remaining / moves_to_go + increment.mul_f64(0.75);
        let scaled = base.mul_f64(complexity.clamp(0.5, 2.0));

        let floor = remaining / 40;
        let ceiling = remaining / 4;
        scaled
            .clamp(floor, ceiling.max(floor))
            .saturating_sub(OVERHEAD)
            .max(MIN_BUDGET)
    }
}

/// Estimate how tactically demanding the root position is, as a scale
/// factor for the time allocation. Checks, dense capture possibilities
/// and wide move choice all buy more time; cramped quiet positions give
/// some back.
pub fn position_complexity(board: &Board) -> f64 {
    let mut movegen = MoveGen::new_legal(board);
    let mobility = movegen.len();

    movegen.set_iterator_mask(*board.color_combined(!board.side_to_move()));
    let captures = movegen.count();

    let mut complexity = 1.0;
    if *board.checkers() != chess::EMPTY {
        complexity += 0.4;
    }
    complexity += 0.3 * (captures.min(8) as f64 / 8.0);
    if mobility >= 35 {
        complexity += 0.2;
    } else if mobility <= 10 {
        complexity -= 0.2;
    }
    complexity.clamp(0.6, 1.8)
}
