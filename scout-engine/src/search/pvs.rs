//! Principal-variation (NegaScout) search.
//!
//! The side to move is always the maxing player; child scores are
//! negated on return. The first ordered move at a node is searched with
//! the full window, every later move with a null window, re-searching on
//! an in-window fail-high. Quiet late moves are reduced and re-searched
//! at full depth if the reduced search surprises.
//!
//! The board model is copy-make: each node owns its child boards, so no
//! board state can leak across cutoffs or cancellation. The one paired
//! resource is the repetition hash stack, pushed before every recursion
//! and popped immediately after it on all paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess::{Board, BoardStatus, ChessMove, Color, Piece, EMPTY};

use crate::config::SearchConfig;
use crate::eval::Evaluate;
use crate::exchange::is_capture;
use crate::moveorder::MoveOrderer;
use crate::score::{Cp, MAX_PLY};
use crate::search::history::{insufficient_material, History};
use crate::search::{Line, SearchStatistics};
use crate::timeman::is_out_of_time;
use crate::transposition::{Bound, TranspositionTable};

/// One search worker. Owns everything a single search needs except the
/// transposition table and heuristic tables, which it borrows so they
/// persist between searches of the same game.
pub(crate) struct Searcher<'a> {
    pub(crate) config: &'a SearchConfig,
    pub(crate) evaluator: &'a dyn Evaluate,
    pub(crate) tt: &'a mut TranspositionTable,
    pub(crate) orderer: &'a mut MoveOrderer,
    pub(crate) history: History,
    pub(crate) root_player: Color,
    pub(crate) stats: SearchStatistics,

    pub(crate) start_time: Instant,
    pub(crate) budget: Option<Duration>,
    pub(crate) stopper: Arc<AtomicBool>,
    pub(crate) aborted: bool,

    /// Principal variation of the previous iteration, tried first while
    /// the current line still follows it.
    pub(crate) prev_pv: Line,
    follow_pv: bool,
}

/// Result of searching the root to one depth. `completed` is false when
/// the iteration was cut short by cancellation; partial results must not
/// be adopted.
#[derive(Debug, Clone)]
pub(crate) struct RootOutcome {
    pub score: Cp,
    pub best_move: Option<ChessMove>,
    pub pv: Line,
    pub completed: bool,
}

impl<'a> Searcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &'a SearchConfig,
        evaluator: &'a dyn Evaluate,
        tt: &'a mut TranspositionTable,
        orderer: &'a mut MoveOrderer,
        history: History,
        root_player: Color,
        start_time: Instant,
        budget: Option<Duration>,
        stopper: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            evaluator,
            tt,
            orderer,
            history,
            root_player,
            stats: SearchStatistics::default(),
            start_time,
            budget,
            stopper,
            aborted: false,
            prev_pv: Line::new(),
            follow_pv: false,
        }
    }

    /// Cooperative cancellation poll. The stop flag is read on every
    /// call; the wall clock only every `stop_check_interval` nodes.
    /// Once tripped the search stays aborted.
    pub(crate) fn should_stop(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if self.stopper.load(Ordering::Relaxed) {
            self.aborted = true;
            return true;
        }
        if self.stats.nodes % self.config.stop_check_interval == 0 {
            if let Some(budget) = self.budget {
                if is_out_of_time(self.start_time, budget) {
                    self.aborted = true;
                }
            }
        }
        self.aborted
    }

    /// Draw score from the perspective of `board`'s side to move,
    /// honoring contempt (configured from the engine's perspective).
    pub(crate) fn draw_score(&self, board: &Board) -> Cp {
        if board.side_to_move() == self.root_player {
            self.config.contempt
        } else {
            -self.config.contempt
        }
    }

    /// Search the root position to `depth` inside the `(alpha, beta)`
    /// window. The root never prunes: every move gets searched unless
    /// the search is cancelled.
    pub(crate) fn search_root(
        &mut self,
        board: &Board,
        depth: u8,
        mut alpha: Cp,
        beta: Cp,
    ) -> RootOutcome {
        self.follow_pv = true;
        let hash = board.get_hash();
        let pv_move = self.prev_pv.first().copied();
        let tt_move = self.tt.probe(hash, 0).and_then(|probe| probe.best_move);
        let moves = self.orderer.order_moves(board, 0, tt_move, pv_move, None);
        debug_assert!(!moves.is_empty(), "root must have legal moves");

        let original_alpha = alpha;
        let mut best_score = -Cp::INFINITE;
        let mut best_move = None;
        let mut pv = Line::new();
        let mut child_pv = Line::new();

        for (index, mv) in moves.iter().copied().enumerate() {
            let child = board.make_move_new(mv);
            self.follow_pv = index == 0 && pv_move.map_or(true, |pv_mv| pv_mv == mv);

            self.history.push(hash);
            let score = if index == 0 {
                -self.pvs(&child, depth - 1, 1, -beta, -alpha, &mut child_pv, Some(mv), true)
            } else {
                let mut score = -self.pvs(
                    &child,
                    depth - 1,
                    1,
                    -(alpha + Cp(1)),
                    -alpha,
                    &mut child_pv,
                    Some(mv),
                    true,
                );
                if score > alpha && score < beta && !self.aborted {
                    score = -self.pvs(
                        &child,
                        depth - 1,
                        1,
                        -beta,
                        -alpha,
                        &mut child_pv,
                        Some(mv),
                        true,
                    );
                }
                score
            };
            self.history.pop();

            if self.aborted {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                pv.clear();
                pv.push(mv);
                pv.extend(child_pv.iter().copied());
            }
            if best_score > alpha {
                alpha = best_score;
            }
            if alpha >= beta {
                break;
            }
        }
        self.follow_pv = false;

        let completed = !self.aborted;
        if completed {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score > original_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(hash, depth, 0, best_score, bound, best_move);
        }

        RootOutcome {
            score: best_score,
            best_move,
            pv,
            completed,
        }
    }

    /// Recursive NegaScout node. Returns the best score found, relative
    /// to `board`'s side to move; fills `pv` with the continuation that
    /// produced it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn pvs(
        &mut self,
        board: &Board,
        depth: u8,
        ply: usize,
        mut alpha: Cp,
        mut beta: Cp,
        pv: &mut Line,
        preceding: Option<ChessMove>,
        allow_null: bool,
    ) -> Cp {
        self.stats.nodes += 1;
        pv.clear();
        if self.should_stop() {
            return alpha;
        }

        let hash = board.get_hash();
        if self.history.is_repetition(hash) || insufficient_material(board) {
            return self.draw_score(board);
        }

        match board.status() {
            BoardStatus::Checkmate => return Cp::mated_in(ply),
            BoardStatus::Stalemate => return self.draw_score(board),
            BoardStatus::Ongoing => {}
        }

        if depth == 0 || ply >= MAX_PLY - 1 {
            return self.quiescence(board, alpha, beta, ply, 0);
        }

        // Transposition table probe. A deep-enough entry can answer the
        // node outright or tighten the window; a shallow one still
        // provides the best move as an ordering hint.
        self.stats.tt_lookups += 1;
        let mut tt_move = None;
        if let Some(probe) = self.tt.probe(hash, ply) {
            self.stats.tt_hits += 1;
            tt_move = probe.best_move;

            if probe.depth >= depth {
                match probe.bound {
                    Bound::Exact => {
                        self.stats.tt_cuts += 1;
                        if let Some(mv) = probe.best_move {
                            pv.push(mv);
                        }
                        return probe.score;
                    }
                    Bound::Lower => alpha = alpha.max(probe.score),
                    Bound::Upper => beta = beta.min(probe.score),
                }
                if alpha >= beta {
                    self.stats.tt_cuts += 1;
                    return probe.score;
                }
            }
        }

        let in_check = *board.checkers() != EMPTY;

        // Null-move pruning: give the opponent a free move at reduced
        // depth; if they still cannot reach beta, this node will not
        // either. Unsound in zugzwang, so it requires non-pawn material
        // and is never tried in check or on mate-bound windows.
        if allow_null
            && self.config.null_move_pruning
            && depth >= self.config.null_move_min_depth
            && !in_check
            && !beta.is_mate()
            && has_non_pawn_material(board)
        {
            if let Some(null_board) = board.null_move() {
                let reduction = 2 + depth / 6;
                let reduced = depth.saturating_sub(1 + reduction);
                let mut null_pv = Line::new();

                self.history.push(hash);
                let score = -self.pvs(
                    &null_board,
                    reduced,
                    ply + 1,
                    -beta,
                    -(beta - Cp(1)),
                    &mut null_pv,
                    None,
                    false,
                );
                self.history.pop();

                if self.aborted {
                    return alpha;
                }
                if score >= beta {
                    self.stats.null_cuts += 1;
                    return beta;
                }
            }
        }

        let pv_move = if self.follow_pv {
            self.prev_pv.get(ply).copied()
        } else {
            None
        };
        let moves = self
            .orderer
            .order_moves(board, ply, tt_move, pv_move, preceding);
        debug_assert!(!moves.is_empty(), "terminal nodes already returned");

        let original_alpha = alpha;
        let was_following = self.follow_pv;
        let mut best_score = -Cp::INFINITE;
        let mut best_move = None;
        let mut child_pv = Line::new();

        for (index, mv) in moves.iter().copied().enumerate() {
            let child = board.make_move_new(mv);
            let quiet = !is_capture(board, mv) && mv.get_promotion().is_none();
            let gives_check = *child.checkers() != EMPTY;
            self.follow_pv = was_following && pv_move == Some(mv);

            self.history.push(hash);
            let score = if index == 0 {
                -self.pvs(
                    &child,
                    depth - 1,
                    ply + 1,
                    -beta,
                    -alpha,
                    &mut child_pv,
                    Some(mv),
                    true,
                )
            } else {
                // Late-move reduction: quiet moves far down the ordering
                // rarely matter; search them shallower first.
                let mut reduction = 0u8;
                if self.config.late_move_reduction
                    && quiet
                    && !in_check
                    && !gives_check
                    && depth >= self.config.lmr_min_depth
                    && index >= self.config.lmr_threshold
                {
                    reduction = 1 + u8::from(index >= 2 * self.config.lmr_threshold);
                }

                let mut score = -self.pvs(
                    &child,
                    depth - 1 - reduction,
                    ply + 1,
                    -(alpha + Cp(1)),
                    -alpha,
                    &mut child_pv,
                    Some(mv),
                    true,
                );
                if reduction > 0 && score > alpha && !self.aborted {
                    score = -self.pvs(
                        &child,
                        depth - 1,
                        ply + 1,
                        -(alpha + Cp(1)),
                        -alpha,
                        &mut child_pv,
                        Some(mv),
                        true,
                    );
                }
                if score > alpha && score < beta && !self.aborted {
                    score = -self.pvs(
                        &child,
                        depth - 1,
                        ply + 1,
                        -beta,
                        -alpha,
                        &mut child_pv,
                        Some(mv),
                        true,
                    );
                }
                score
            };
            self.history.pop();

            if self.aborted {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                pv.clear();
                pv.push(mv);
                pv.extend(child_pv.iter().copied());
            }
            if best_score > alpha {
                alpha = best_score;
            }

            if alpha >= beta {
                self.stats.cut_nodes += 1;
                if quiet {
                    self.orderer.record_killer(ply, mv);
                    self.orderer.record_history_cutoff(mv, depth);
                    self.orderer.record_counter(preceding, mv);
                }
                break;
            } else if quiet {
                self.orderer.record_history_fail(mv, depth);
            }
        }
        self.follow_pv = was_following;

        if self.aborted {
            // Partial results never enter the table.
            return best_score.max(alpha);
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > original_alpha {
            self.stats.pv_nodes += 1;
            Bound::Exact
        } else {
            self.stats.all_nodes += 1;
            Bound::Upper
        };
        self.tt.store(hash, depth, ply, best_score, bound, best_move);

        best_score
    }
}

/// Side to move owns at least one piece that is not a pawn or the king.
fn has_non_pawn_material(board: &Board) -> bool {
    let pieces = *board.pieces(Piece::Knight)
        | *board.pieces(Piece::Bishop)
        | *board.pieces(Piece::Rook)
        | *board.pieces(Piece::Queen);
    pieces & *board.color_combined(board.side_to_move()) != EMPTY
}
