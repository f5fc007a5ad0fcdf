//! Quiescence search.
//!
//! The main search cannot stop on a position in the middle of a capture
//! sequence; the static evaluation there is meaningless. Quiescence
//! extends past the horizon playing only forcing moves until the
//! position settles, using the stand-pat evaluation as a floor when the
//! side to move is free to decline the tactics.

use chess::{BitBoard, BoardStatus, MoveGen, EMPTY};

use crate::exchange::{capture_gain, exchange_value, is_capture};
use crate::moveorder::gives_direct_check;
use crate::score::{Cp, MAX_PLY};
use crate::search::history::insufficient_material;
use crate::search::pvs::Searcher;

impl Searcher<'_> {
    /// Resolve captures (and early checks) from `board` until the
    /// position is quiet. `qply` counts plies below the main-search
    /// horizon; `ply` keeps counting from the root so mate scores and
    /// the repetition stack stay consistent.
    pub(crate) fn quiescence(
        &mut self,
        board: &chess::Board,
        mut alpha: Cp,
        beta: Cp,
        ply: usize,
        qply: u8,
    ) -> Cp {
        self.stats.nodes += 1;
        self.stats.q_nodes += 1;
        if self.should_stop() {
            return alpha;
        }

        if self.history.is_repetition(board.get_hash()) || insufficient_material(board) {
            return self.draw_score(board);
        }
        match board.status() {
            BoardStatus::Checkmate => return Cp::mated_in(ply),
            BoardStatus::Stalemate => return self.draw_score(board),
            BoardStatus::Ongoing => {}
        }

        let stand_pat = self.evaluator.evaluate(board);
        if qply >= self.config.max_q_ply || ply >= MAX_PLY - 1 {
            return stand_pat;
        }

        let in_check = *board.checkers() != EMPTY;
        let mut best = if in_check {
            // In check there is no right to stand pat; every evasion
            // must be examined.
            -Cp::INFINITE
        } else {
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            stand_pat
        };

        let mut moves = crate::moveorder::MoveList::new();
        let mut movegen = MoveGen::new_legal(board);
        if in_check {
            moves.extend(&mut movegen);
        } else {
            // Captures first, ranked by approximate exchange value. An
            // en passant capture lands behind its victim, so that empty
            // square joins the mask.
            let mut targets = *board.color_combined(!board.side_to_move());
            if let Some(victim) = board.en_passant() {
                if let Some(dest) = victim.forward(board.side_to_move()) {
                    targets |= BitBoard::from_square(dest);
                }
            }
            movegen.set_iterator_mask(targets);
            moves.extend(&mut movegen);
            moves.sort_unstable_by_key(|mv| std::cmp::Reverse(exchange_value(board, *mv)));

            // Then non-capture promotions, and checking moves while the
            // quiescence is still shallow.
            movegen.set_iterator_mask(!EMPTY);
            for mv in &mut movegen {
                if mv.get_promotion().is_some()
                    || (qply < self.config.q_check_plies && gives_direct_check(board, mv))
                {
                    moves.push(mv);
                }
            }
        }

        let hash = board.get_hash();
        for mv in moves {
            // Delta pruning: if even the full material swing of this
            // capture cannot lift the score near alpha, skip it.
            if !in_check
                && is_capture(board, mv)
                && stand_pat + capture_gain(board, mv) + self.config.delta_margin <= alpha
            {
                continue;
            }

            let child = board.make_move_new(mv);
            self.history.push(hash);
            let score = -self.quiescence(&child, -beta, -alpha, ply + 1, qply + 1);
            self.history.pop();

            if self.aborted {
                break;
            }

            if score > best {
                best = score;
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                break;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::eval::{Evaluate, Material};
    use crate::moveorder::MoveOrderer;
    use crate::search::history::History;
    use crate::transposition::TranspositionTable;
    use chess::Board;
    use std::str::FromStr;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Instant;

    fn quiesce(fen: &str, alpha: Cp, beta: Cp) -> Cp {
        let board = Board::from_str(fen).unwrap();
        let config = SearchConfig::new();
        let evaluator = Material;
        let mut tt = TranspositionTable::with_capacity(1024);
        let mut orderer = MoveOrderer::new();
        let mut searcher = Searcher::new(
            &config,
            &evaluator,
            &mut tt,
            &mut orderer,
            History::empty(),
            board.side_to_move(),
            Instant::now(),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        searcher.quiescence(&board, alpha, beta, 0, 0)
    }

    fn quiesce_with(config: &SearchConfig, fen: &str) -> (Cp, u64) {
        let board = Board::from_str(fen).unwrap();
        let evaluator = Material;
        let mut tt = TranspositionTable::with_capacity(1024);
        let mut orderer = MoveOrderer::new();
        let mut searcher = Searcher::new(
            config,
            &evaluator,
            &mut tt,
            &mut orderer,
            History::empty(),
            board.side_to_move(),
            Instant::now(),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        let score = searcher.quiescence(&board, -Cp::INFINITE, Cp::INFINITE, 0, 0);
        (score, searcher.stats.q_nodes)
    }

    #[test]
    fn quiet_position_stands_pat() {
        let fen = "4k3/pppp4/8/8/8/8/PPPP4/4K3 w - - 0 1";
        let board = Board::from_str(fen).unwrap();
        let score = quiesce(fen, -Cp::INFINITE, Cp::INFINITE);
        assert_eq!(score, Material.evaluate(&board));
    }

    #[test]
    fn hanging_piece_is_taken() {
        // White queen takes the undefended rook along the fifth rank,
        // lifting the score well above the static evaluation.
        let fen = "4k3/8/8/Q6r/8/8/8/4K3 w - - 0 1";
        let board = Board::from_str(fen).unwrap();

        let score = quiesce(fen, -Cp::INFINITE, Cp::INFINITE);
        assert!(score >= Material.evaluate(&board) + Cp(300));
    }

    #[test]
    fn losing_capture_declined() {
        // Black's only capture trades the queen for a defended pawn.
        // Standing pat bounds the score near the static evaluation.
        let fen = "4k3/8/8/2q5/8/2P5/1P6/7K b - - 0 1";
        let board = Board::from_str(fen).unwrap();

        let score = quiesce(fen, -Cp::INFINITE, Cp::INFINITE);
        let stand_pat = Material.evaluate(&board);
        assert!(score >= stand_pat);
        assert!(score < stand_pat + Cp(300));
    }

    #[test]
    fn en_passant_capture_is_not_stood_past() {
        // Black's d-pawn just double-stepped past e5; taking it en
        // passant wins a clean pawn.
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        let board = Board::from_str(fen).unwrap();

        let score = quiesce(fen, -Cp::INFINITE, Cp::INFINITE);
        assert!(score >= Material.evaluate(&board) + Cp(80));
    }

    // Interlocked central tension: four mutual pawn captures with piece
    // recaptures behind each, so capture chains outrun any small ceiling.
    const TENSION_FEN: &str =
        "2r1r1k1/1bq1npp1/3b1n2/1pp1pp2/1PP1PP2/3B1N2/1BQ1NPP1/2R1R1K1 w - - 0 1";

    #[test]
    fn qply_ceiling_bounds_capture_chains() {
        let board = Board::from_str(TENSION_FEN).unwrap();
        let mut config = SearchConfig::new();

        // Ceiling zero degenerates to the static evaluation.
        config.max_q_ply = 0;
        let (score, q_nodes) = quiesce_with(&config, TENSION_FEN);
        assert_eq!(score, Material.evaluate(&board));
        assert_eq!(q_nodes, 1);

        // One ply: the root's forcing moves and nothing below them.
        config.max_q_ply = 1;
        let (_, q_nodes) = quiesce_with(&config, TENSION_FEN);
        assert!(q_nodes > 1);
        assert!(q_nodes <= 64);

        // The default ceiling resolves the whole tension and returns.
        let (score, q_nodes) = quiesce_with(&SearchConfig::new(), TENSION_FEN);
        assert!(!score.is_mate());
        assert!(q_nodes > 1);
    }
}
