//! Search functions and result types.

pub(crate) mod history;
mod ids;
mod pvs;
mod quiescence;

pub use history::{insufficient_material, History};

use std::fmt::{self, Display};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use chess::{ChessMove, Color};

use crate::config::SearchConfig;
use crate::error::Result;
use crate::eval::{Evaluate, Material};
use crate::game::Game;
use crate::moveorder::MoveOrderer;
use crate::score::{Cp, CpKind, MAX_PLY};
use crate::timeman::Mode;
use crate::transposition::TranspositionTable;

/// A sequence of moves from some root position, best move first.
pub type Line = ArrayVec<ChessMove, MAX_PLY>;

/// Renders a line as space-separated coordinate moves.
pub fn display_line(line: &Line) -> String {
    line.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn sign(color: Color) -> CpKind {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Node counters accumulated over a whole search.
#[derive(Debug, Copy, Clone, Default)]
pub struct SearchStatistics {
    /// All visited nodes, main search and quiescence together.
    pub nodes: u64,
    /// Nodes visited inside quiescence search.
    pub q_nodes: u64,
    /// Nodes that ended in a beta cutoff.
    pub cut_nodes: u64,
    /// Nodes whose best score was exact, inside the window.
    pub pv_nodes: u64,
    /// Nodes where no move improved alpha.
    pub all_nodes: u64,
    /// Transposition table probes issued.
    pub tt_lookups: u64,
    /// Probes that found their position.
    pub tt_hits: u64,
    /// Hits that answered the node without any search.
    pub tt_cuts: u64,
    /// Nodes pruned by a null-move refutation.
    pub null_cuts: u64,
}

impl SearchStatistics {
    /// Fraction of probes that found an entry.
    pub fn tt_hit_ratio(&self) -> f64 {
        if self.tt_lookups == 0 {
            return 0.0;
        }
        self.tt_hits as f64 / self.tt_lookups as f64
    }

    /// Fraction of all nodes that were quiescence nodes.
    pub fn quiescence_ratio(&self) -> f64 {
        if self.nodes == 0 {
            return 0.0;
        }
        self.q_nodes as f64 / self.nodes as f64
    }
}

/// The result of searching a root position.
///
/// `score` is relative to `player`, the side to move at the root; use
/// [`SearchResult::absolute_score`] for a White-positive value.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found for the root position.
    pub best_move: ChessMove,
    /// Expected reply, second move of the principal variation.
    pub ponder: Option<ChessMove>,
    /// Score of the root, relative to `player`.
    pub score: Cp,
    /// The principal variation that produced `score`.
    pub pv: Line,
    /// Side to move at the root.
    pub player: Color,
    /// Deepest fully completed iteration.
    pub depth: u8,
    /// Node and table counters for the whole search.
    pub stats: SearchStatistics,
    /// Wall-clock time from start of search to its end.
    pub elapsed: Duration,
    /// True if the search was cut short by a stop or the clock.
    pub stopped: bool,
}

impl SearchResult {
    /// A result holding a legal fallback move before any iteration has
    /// completed. Never returned with `depth > 0` unless overwritten.
    pub(crate) fn preliminary(best_move: ChessMove, player: Color) -> Self {
        Self {
            best_move,
            ponder: None,
            score: Cp::DRAW,
            pv: Line::new(),
            player,
            depth: 0,
            stats: SearchStatistics::default(),
            elapsed: Duration::ZERO,
            stopped: false,
        }
    }

    /// Average nodes per second over the whole search.
    pub fn nps(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        (self.stats.nodes as f64 / self.elapsed.as_secs_f64()).round()
    }

    /// Score relative to the root player: positive is good for the side
    /// that searched.
    pub fn relative_score(&self) -> Cp {
        self.score
    }

    /// Score with White positive and Black negative.
    pub fn absolute_score(&self) -> Cp {
        self.score * sign(self.player)
    }

    /// The color ahead at the root, or None if level.
    pub fn leading(&self) -> Option<Color> {
        match self.absolute_score().signum() {
            1 => Some(Color::White),
            -1 => Some(Color::Black),
            _ => None,
        }
    }
}

impl Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SearchResult {{")?;
        writeln!(f, "    best_move: {}", self.best_move)?;
        writeln!(f, "    score    : {} ({:?})", self.score, self.player)?;
        writeln!(f, "    pv       : {}", display_line(&self.pv))?;
        writeln!(f, "    depth    : {}", self.depth)?;
        writeln!(f, "    nodes    : {}", self.stats.nodes)?;
        writeln!(f, "    nps      : {}", self.nps())?;
        writeln!(
            f,
            "    elapsed  : {}.{:03}s",
            self.elapsed.as_secs(),
            self.elapsed.subsec_millis()
        )?;
        writeln!(f, "    q_ratio  : {:.2}", self.stats.quiescence_ratio())?;
        writeln!(f, "    tt_ratio : {:.2}", self.stats.tt_hit_ratio())?;
        writeln!(f, "    stopped  : {}", self.stopped)?;
        write!(f, "}}")
    }
}

/// A progress report emitted after each completed iteration.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    pub depth: u8,
    pub score: Cp,
    pub nodes: u64,
    pub elapsed: Duration,
    /// Transposition table fill level, permille.
    pub hashfull: usize,
    pub pv: Line,
}

/// Messages a running search sends back to its owner.
#[derive(Debug, Clone)]
pub enum SearchUpdate {
    /// An iteration completed; the search is still running.
    Progress(SearchProgress),
    /// The search finished with this result.
    Finished(SearchResult),
}

impl From<SearchResult> for SearchUpdate {
    fn from(result: SearchResult) -> Self {
        Self::Finished(result)
    }
}

/// Run a search to completion on the calling thread.
#[allow(clippy::too_many_arguments)]
pub fn search(
    game: &Game,
    mode: Mode,
    config: &SearchConfig,
    evaluator: &dyn Evaluate,
    tt: &mut TranspositionTable,
    orderer: &mut MoveOrderer,
    stopper: Arc<AtomicBool>,
    progress: Option<&mpsc::Sender<SearchUpdate>>,
) -> Result<SearchResult> {
    ids::ids(
        game,
        mode,
        config,
        evaluator,
        tt,
        orderer,
        Instant::now(),
        stopper,
        progress,
    )
}

/// Depth-limited search with default configuration and evaluator.
pub fn search_to_depth(
    game: &Game,
    depth: u8,
    tt: &mut TranspositionTable,
) -> Result<SearchResult> {
    let mut orderer = MoveOrderer::new();
    search(
        game,
        Mode::depth(depth, None),
        &SearchConfig::new(),
        &Material,
        tt,
        &mut orderer,
        Arc::new(AtomicBool::new(false)),
        None,
    )
}

/// Run a search on its own thread. Progress and the final result arrive
/// over `sender`; the shared tables are locked for the duration of the
/// search.
#[allow(clippy::too_many_arguments)]
pub fn search_nonblocking(
    game: Game,
    mode: Mode,
    config: SearchConfig,
    evaluator: Arc<dyn Evaluate + Send + Sync>,
    tt: Arc<Mutex<TranspositionTable>>,
    orderer: Arc<Mutex<MoveOrderer>>,
    stopper: Arc<AtomicBool>,
    sender: mpsc::Sender<SearchUpdate>,
) -> thread::JoinHandle<()> {
    let start_time = Instant::now();

    thread::spawn(move || {
        let mut tt = tt.lock().unwrap_or_else(PoisonError::into_inner);
        let mut orderer = orderer.lock().unwrap_or_else(PoisonError::into_inner);

        let result = ids::ids(
            &game,
            mode,
            &config,
            evaluator.as_ref(),
            &mut tt,
            &mut orderer,
            start_time,
            stopper,
            Some(&sender),
        );
        match result {
            Ok(result) => {
                // A closed receiver just means nobody wants the answer.
                let _ = sender.send(result.into());
            }
            Err(err) => log::error!("search not started: {err}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Board;
    use std::str::FromStr;

    #[test]
    fn depth_one_finds_a_legal_move() {
        let game = Game::start_position();
        let mut tt = TranspositionTable::with_capacity(4096);
        let result = search_to_depth(&game, 1, &mut tt).unwrap();

        assert!(game.board().legal(result.best_move));
        assert_eq!(result.depth, 1);
        assert!(!result.stopped);
    }

    #[test]
    fn free_queen_is_captured() {
        // White queen hangs on d5 with black to move.
        let board = Board::from_str("4k3/8/1n6/3Q4/8/8/8/4K3 b - - 0 1").unwrap();
        let game = Game::from(board);
        let mut tt = TranspositionTable::with_capacity(4096);

        let result = search_to_depth(&game, 3, &mut tt).unwrap();
        assert_eq!(result.best_move, ChessMove::from_str("b6d5").unwrap());
    }

    #[test]
    fn game_over_position_is_rejected() {
        // Fool's mate: white is checkmated, no move to search for.
        let board = Board::from_str(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 2 3",
        )
        .unwrap();
        let game = Game::from(board);
        let mut tt = TranspositionTable::with_capacity(4096);

        assert!(search_to_depth(&game, 2, &mut tt).is_err());
    }

    #[test]
    fn absolute_score_flips_for_black() {
        let mut result = SearchResult::preliminary(ChessMove::from_str("e2e4").unwrap(), Color::Black);
        result.score = Cp(80);
        assert_eq!(result.relative_score(), Cp(80));
        assert_eq!(result.absolute_score(), Cp(-80));
    }
}
