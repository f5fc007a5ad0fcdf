//! Iterative deepening driver.
//!
//! Depth-limited searches run back to back, each seeded by the previous
//! iteration's principal variation and transposition entries, until the
//! mode's depth or time limit is reached or the search is stopped. Only
//! fully completed iterations are adopted: a cancelled iteration is
//! discarded and the previous result stands, so the reported move has
//! always been verified to full depth.
//!
//! Each iteration runs behind a panic boundary. A fault inside the tree
//! is logged and the last completed result is kept; a crash must never
//! lose the move the search already proved.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::time::Instant;

use chess::MoveGen;

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::eval::Evaluate;
use crate::game::Game;
use crate::moveorder::MoveOrderer;
use crate::score::Cp;
use crate::search::history::History;
use crate::search::pvs::{RootOutcome, Searcher};
use crate::search::{SearchProgress, SearchResult, SearchUpdate};
use crate::timeman::{position_complexity, Mode};
use crate::transposition::TranspositionTable;

#[allow(clippy::too_many_arguments)]
pub(crate) fn ids(
    game: &Game,
    mode: Mode,
    config: &SearchConfig,
    evaluator: &dyn Evaluate,
    tt: &mut TranspositionTable,
    orderer: &mut MoveOrderer,
    start_time: Instant,
    stopper: Arc<AtomicBool>,
    progress: Option<&mpsc::Sender<SearchUpdate>>,
) -> Result<SearchResult> {
    let board = *game.board();
    let player = board.side_to_move();
    let legal_moves = game.legal_move_count();
    if legal_moves == 0 {
        return Err(Error::NoLegalMoves);
    }

    let complexity = position_complexity(&board);
    let budget = mode.budget(player, complexity);
    let max_depth = mode.max_depth();
    tt.new_search();

    log::debug!(
        "search start: mode {:?}, budget {:?}, complexity {:.2}, {} legal moves",
        mode,
        budget,
        complexity,
        legal_moves
    );

    let mut searcher = Searcher::new(
        config,
        evaluator,
        tt,
        orderer,
        History::new(game),
        player,
        start_time,
        budget,
        stopper,
    );

    // If not even depth 1 completes, any legal move beats no move.
    let fallback = MoveGen::new_legal(&board)
        .next()
        .ok_or(Error::NoLegalMoves)?;
    let mut result = SearchResult::preliminary(fallback, player);

    let mut completed_any = false;
    for depth in 1..=max_depth {
        let window = (completed_any
            && depth >= config.aspiration_min_depth
            && !result.score.is_mate())
        .then(|| {
            (
                result.score - config.aspiration_width,
                result.score + config.aspiration_width,
            )
        });

        let outcome = match run_iteration(&mut searcher, &board, depth, window) {
            Some(outcome) if outcome.completed => outcome,
            _ => break,
        };

        completed_any = true;
        result.best_move = outcome.best_move.unwrap_or(result.best_move);
        result.score = outcome.score;
        result.pv = outcome.pv;
        result.depth = depth;
        searcher.prev_pv = result.pv.clone();

        if let Some(sender) = progress {
            let update = SearchProgress {
                depth,
                score: result.score,
                nodes: searcher.stats.nodes,
                elapsed: start_time.elapsed(),
                hashfull: searcher.tt.load_factor(),
                pv: result.pv.clone(),
            };
            let _ = sender.send(SearchUpdate::Progress(update));
        }

        // With one legal move the choice cannot change; one iteration
        // verifies it and the rest of the clock is saved.
        if legal_moves == 1 {
            break;
        }
        // A mate proven within this iteration's horizon is final.
        if result.score.is_mate() {
            let plies = (Cp::MATE.0 - result.score.0.abs()) as u8;
            if plies <= depth {
                break;
            }
        }
        if searcher.should_stop() {
            break;
        }
        // Starting an iteration that cannot finish wastes the clock;
        // each iteration costs several times the previous one.
        if let Some(budget) = budget {
            if start_time.elapsed() * 2 >= budget {
                break;
            }
        }
    }

    result.stats = searcher.stats;
    result.elapsed = start_time.elapsed();
    result.stopped = searcher.aborted || !completed_any;
    result.ponder = result.pv.get(1).copied();

    log::debug!(
        "search done: depth {}, score {}, {} nodes in {:?}",
        result.depth,
        result.score,
        result.stats.nodes,
        result.elapsed
    );
    Ok(result)
}

/// Search the root to `depth`, inside the aspiration `window` when one is
/// given, falling back to a full-window re-search if the score lands on
/// or outside either bound. Returns None if the iteration panicked.
fn run_iteration(
    searcher: &mut Searcher,
    board: &chess::Board,
    depth: u8,
    window: Option<(Cp, Cp)>,
) -> Option<RootOutcome> {
    let mut attempt = |searcher: &mut Searcher, alpha: Cp, beta: Cp| -> Option<RootOutcome> {
        catch_unwind(AssertUnwindSafe(|| {
            searcher.search_root(board, depth, alpha, beta)
        }))
        .map_err(|_| {
            log::error!("iteration at depth {depth} panicked; keeping last completed result");
        })
        .ok()
    };

    let (alpha, beta) = window.unwrap_or((-Cp::INFINITE, Cp::INFINITE));
    let outcome = attempt(searcher, alpha, beta)?;

    if window.is_some() && outcome.completed && (outcome.score <= alpha || outcome.score >= beta) {
        log::debug!(
            "aspiration window ({}, {}) failed at depth {} with {}, re-searching",
            alpha,
            beta,
            depth,
            outcome.score
        );
        return attempt(searcher, -Cp::INFINITE, Cp::INFINITE);
    }
    Some(outcome)
}
