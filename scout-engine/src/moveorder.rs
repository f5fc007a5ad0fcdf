//! Move ordering.
//!
//! Move ordering is what makes alpha-beta pruning effective: if the best
//! move is searched first, the rest of the node is cutoffs. The orderer
//! owns the killer, history and counter-move tables and ranks a node's
//! legal moves by a fixed priority chain:
//!
//! 1. transposition table move
//! 2. principal-variation move from the previous iteration
//! 3. captures and promotions by approximate exchange value, winning first
//! 4. killer moves for this ply, slot 0 before slot 1
//! 5. counter move to the opponent's last move
//! 6. history score for (from, to)
//! 7. piece-square delta and a bonus for checking moves;
//!    losing captures rank below every quiet move with positive heuristics

use arrayvec::ArrayVec;
use chess::{
    get_bishop_moves, get_knight_moves, get_pawn_attacks, get_rook_moves, BitBoard, Board,
    ChessMove, MoveGen, Piece,
};

use crate::eval::piece_square;
use crate::exchange::{exchange_value, is_capture};
use crate::score::{CpKind, MAX_PLY};

/// The most legal moves any chess position can have.
pub const MAX_MOVES: usize = 218;

/// A node's legal moves, ordered best first.
pub type MoveList = ArrayVec<ChessMove, MAX_MOVES>;

const TT_MOVE: CpKind = 10_000_000;
const PV_MOVE: CpKind = 9_000_000;
const GOOD_CAPTURE: CpKind = 8_000_000;
const KILLER_0: CpKind = 7_000_000;
const KILLER_1: CpKind = 6_900_000;
const COUNTER: CpKind = 6_800_000;
const CHECK_BONUS: CpKind = 4_000;
const LOSING_CAPTURE: CpKind = -2_000_000;

/// History scores are halved whenever any entry's magnitude passes this.
const HISTORY_CEILING: CpKind = 1 << 19;

/// Two killer slots per ply, most recent first.
#[derive(Debug, Clone)]
struct Killers([[Option<ChessMove>; 2]; MAX_PLY]);

impl Killers {
    fn new() -> Self {
        Self([[None; 2]; MAX_PLY])
    }

    fn record(&mut self, ply: usize, mv: ChessMove) {
        let slots = &mut self.0[ply];
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    fn get(&self, ply: usize) -> [Option<ChessMove>; 2] {
        self.0[ply]
    }
}

/// Per (from, to) quiet-move success scores accumulated across searches.
#[derive(Debug, Clone)]
struct HistoryTable(Box<[[CpKind; 64]; 64]>);

impl HistoryTable {
    fn new() -> Self {
        Self(Box::new([[0; 64]; 64]))
    }

    fn get(&self, mv: ChessMove) -> CpKind {
        self.0[mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    fn add(&mut self, mv: ChessMove, delta: CpKind) {
        let entry = &mut self.0[mv.get_source().to_index()][mv.get_dest().to_index()];
        *entry += delta;

        if entry.abs() > HISTORY_CEILING {
            for row in self.0.iter_mut() {
                for value in row.iter_mut() {
                    *value /= 2;
                }
            }
        }
    }
}

/// Best observed reply per opponent (from, to). Last write wins.
#[derive(Debug, Clone)]
struct CounterMoves(Box<[[Option<ChessMove>; 64]; 64]>);

impl CounterMoves {
    fn new() -> Self {
        Self(Box::new([[None; 64]; 64]))
    }

    fn get(&self, preceding: Option<ChessMove>) -> Option<ChessMove> {
        let mv = preceding?;
        self.0[mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    fn record(&mut self, preceding: ChessMove, reply: ChessMove) {
        self.0[preceding.get_source().to_index()][preceding.get_dest().to_index()] = Some(reply);
    }
}

/// Owns the heuristic ordering tables. Tables persist across searches
/// within one game and are cleared on a new game.
#[derive(Debug, Clone)]
pub struct MoveOrderer {
    killers: Killers,
    history: HistoryTable,
    counters: CounterMoves,
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self {
            killers: Killers::new(),
            history: HistoryTable::new(),
            counters: CounterMoves::new(),
        }
    }

    /// Forget everything learned from previous searches.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Record a quiet move that caused a beta cutoff at `ply`.
    /// Callers must not record captures.
    pub fn record_killer(&mut self, ply: usize, mv: ChessMove) {
        if ply < MAX_PLY {
            self.killers.record(ply, mv);
        }
    }

    /// Reward a quiet move that caused a cutoff, scaled by depth squared.
    pub fn record_history_cutoff(&mut self, mv: ChessMove, depth: u8) {
        let depth = depth as CpKind;
        self.history.add(mv, depth * depth);
    }

    /// Penalize a quiet move that was searched without improving alpha.
    pub fn record_history_fail(&mut self, mv: ChessMove, depth: u8) {
        self.history.add(mv, -(depth as CpKind));
    }

    /// Record `reply` as the refutation of `preceding`.
    pub fn record_counter(&mut self, preceding: Option<ChessMove>, reply: ChessMove) {
        if let Some(preceding) = preceding {
            self.counters.record(preceding, reply);
        }
    }

    /// Generate and order all legal moves of `board`, best first.
    pub fn order_moves(
        &self,
        board: &Board,
        ply: usize,
        tt_move: Option<ChessMove>,
        pv_move: Option<ChessMove>,
        preceding: Option<ChessMove>,
    ) -> MoveList {
        let killers = self.killers.get(ply.min(MAX_PLY - 1));
        let counter = self.counters.get(preceding);

        let mut scored: ArrayVec<(ChessMove, CpKind), MAX_MOVES> = MoveGen::new_legal(board)
            .map(|mv| {
                let key = self.score_move(board, mv, tt_move, pv_move, killers, counter);
                (mv, key)
            })
            .collect();

        scored.sort_unstable_by_key(|(_, key)| std::cmp::Reverse(*key));
        scored.into_iter().map(|(mv, _)| mv).collect()
    }

    fn score_move(
        &self,
        board: &Board,
        mv: ChessMove,
        tt_move: Option<ChessMove>,
        pv_move: Option<ChessMove>,
        killers: [Option<ChessMove>; 2],
        counter: Option<ChessMove>,
    ) -> CpKind {
        if tt_move == Some(mv) {
            return TT_MOVE;
        }
        if pv_move == Some(mv) {
            return PV_MOVE;
        }

        if is_capture(board, mv) || mv.get_promotion().is_some() {
            let exchange = exchange_value(board, mv).0;
            return if exchange >= 0 {
                GOOD_CAPTURE + exchange
            } else {
                LOSING_CAPTURE + exchange
            };
        }

        if killers[0] == Some(mv) {
            return KILLER_0;
        }
        if killers[1] == Some(mv) {
            return KILLER_1;
        }
        if counter == Some(mv) {
            return COUNTER;
        }

        let mut score = self.history.get(mv);

        // Positional tie-break: destination minus origin square value.
        if let Some(piece) = board.piece_on(mv.get_source()) {
            let color = board.side_to_move();
            score += (piece_square(piece, color, mv.get_dest())
                - piece_square(piece, color, mv.get_source()))
            .0;
        }
        if gives_direct_check(board, mv) {
            score += CHECK_BONUS;
        }

        score
    }
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap direct-check test: does the moved piece attack the enemy king
/// from its destination square? Discovered checks are not detected; this
/// only feeds an ordering bonus.
pub(crate) fn gives_direct_check(board: &Board, mv: ChessMove) -> bool {
    let us = board.side_to_move();
    let king = board.king_square(!us);
    let king_bb = BitBoard::from_square(king);
    let dest = mv.get_dest();

    // Occupancy after the move, for sliding attacks.
    let occupied = (*board.combined() ^ BitBoard::from_square(mv.get_source()))
        | BitBoard::from_square(dest);

    let piece = mv
        .get_promotion()
        .or_else(|| board.piece_on(mv.get_source()));

    match piece {
        Some(Piece::Knight) => get_knight_moves(dest) & king_bb != BitBoard(0),
        Some(Piece::Bishop) => get_bishop_moves(dest, occupied) & king_bb != BitBoard(0),
        Some(Piece::Rook) => get_rook_moves(dest, occupied) & king_bb != BitBoard(0),
        Some(Piece::Queen) => {
            (get_bishop_moves(dest, occupied) | get_rook_moves(dest, occupied)) & king_bb
                != BitBoard(0)
        }
        Some(Piece::Pawn) => get_pawn_attacks(dest, us, king_bb) != BitBoard(0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn capture_ordered_before_quiet_moves() {
        let board =
            Board::from_str("rnb1k1nr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RN2KBNR b - - 3 11").unwrap();
        let capture = ChessMove::from_str("e5d4").unwrap();

        let orderer = MoveOrderer::new();
        let ordered = orderer.order_moves(&board, 0, None, None, None);

        assert_eq!(ordered.first(), Some(&capture));
    }

    #[test]
    fn tt_move_outranks_everything() {
        let board = Board::default();
        let tt_move = ChessMove::from_str("g1f3").unwrap();

        let orderer = MoveOrderer::new();
        let ordered = orderer.order_moves(&board, 0, Some(tt_move), None, None);

        assert_eq!(ordered.first(), Some(&tt_move));
    }

    #[test]
    fn killers_rank_above_plain_quiets() {
        let board = Board::default();
        let killer = ChessMove::from_str("a2a3").unwrap();

        let mut orderer = MoveOrderer::new();
        orderer.record_killer(3, killer);
        let ordered = orderer.order_moves(&board, 3, None, None, None);

        assert_eq!(ordered.first(), Some(&killer));
    }

    #[test]
    fn killer_slots_shift_most_recent_first() {
        let first = ChessMove::from_str("a2a3").unwrap();
        let second = ChessMove::from_str("b2b3").unwrap();

        let mut killers = Killers::new();
        killers.record(2, first);
        killers.record(2, second);
        assert_eq!(killers.get(2), [Some(second), Some(first)]);

        // Re-recording slot 0 does not duplicate it.
        killers.record(2, second);
        assert_eq!(killers.get(2), [Some(second), Some(first)]);
    }

    #[test]
    fn history_rewards_order_quiet_moves() {
        let board = Board::default();
        let liked = ChessMove::from_str("h2h3").unwrap();

        let mut orderer = MoveOrderer::new();
        orderer.record_history_cutoff(liked, 8);
        let ordered = orderer.order_moves(&board, 0, None, None, None);

        assert_eq!(ordered.first(), Some(&liked));
    }

    #[test]
    fn history_halves_at_ceiling() {
        let mv = ChessMove::from_str("a2a3").unwrap();
        let mut history = HistoryTable::new();

        history.add(mv, HISTORY_CEILING + 100);
        assert_eq!(history.get(mv), (HISTORY_CEILING + 100) / 2);
    }

    #[test]
    fn counter_move_overwrites() {
        let prev = ChessMove::from_str("e7e5").unwrap();
        let first_reply = ChessMove::from_str("g1f3").unwrap();
        let second_reply = ChessMove::from_str("b1c3").unwrap();

        let mut counters = CounterMoves::new();
        counters.record(prev, first_reply);
        counters.record(prev, second_reply);
        assert_eq!(counters.get(Some(prev)), Some(second_reply));
    }

    #[test]
    fn losing_capture_ranks_below_rewarded_quiet() {
        // Queen takes defended pawn must not be tried before a quiet move
        // with positive history.
        let board = Board::from_str("4k3/2p5/1p6/8/8/8/1Q6/4K3 w - - 0 1").unwrap();
        let losing = ChessMove::from_str("b2b6").unwrap(); // QxP, defended by c7
        let quiet = ChessMove::from_str("e1d1").unwrap();

        let mut orderer = MoveOrderer::new();
        orderer.record_history_cutoff(quiet, 3);
        let ordered = orderer.order_moves(&board, 0, None, None, None);

        let quiet_at = ordered.iter().position(|m| *m == quiet).unwrap();
        let losing_at = ordered.iter().position(|m| *m == losing).unwrap();
        assert!(quiet_at < losing_at);
    }
}
