//! Line history used within search.
//!
//! The board model hashes single positions; detecting repetitions needs
//! the hashes of everything played before. `History` seeds itself from
//! the game's move list and is then pushed/popped in lockstep with the
//! search recursion. Every push made on the way into a node must be
//! popped on the way out, on all paths.

use chess::{Board, Piece, EMPTY};

use crate::game::Game;

#[derive(Debug, Clone, Default)]
pub struct History {
    hashes: Vec<u64>,
}

impl History {
    /// An empty history, for searches from a bare position.
    pub fn empty() -> Self {
        Self { hashes: Vec::new() }
    }

    /// History of all positions a game visited before its current one.
    pub fn new(game: &Game) -> Self {
        Self {
            hashes: game.past_hashes(),
        }
    }

    pub fn push(&mut self, hash: u64) {
        self.hashes.push(hash);
    }

    pub fn pop(&mut self) {
        self.hashes.pop();
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Returns true if `hash` already occurred on the current line.
    /// One prior occurrence is enough: a position the search is willing
    /// to repeat once it would repeat forever, so it scores as a draw.
    pub fn is_repetition(&self, hash: u64) -> bool {
        self.hashes.iter().rev().any(|past| *past == hash)
    }
}

/// Returns true for material combinations where no side can possibly
/// deliver mate: bare kings, or king plus a single minor piece.
pub fn insufficient_material(board: &Board) -> bool {
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }

    let minors = *board.pieces(Piece::Knight) | *board.pieces(Piece::Bishop);
    minors.popcnt() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::ChessMove;
    use std::str::FromStr;

    #[test]
    fn repetition_found_after_shuffle() {
        // Knights out and back: the start position repeats.
        let moves = ["g1f3", "g8f6", "f3g1", "f6g8"]
            .iter()
            .map(|s| ChessMove::from_str(s).unwrap())
            .collect();
        let game = Game::new(Board::default(), moves).unwrap();
        let history = History::new(&game);

        assert!(history.is_repetition(game.board().get_hash()));
    }

    #[test]
    fn push_pop_restores_state() {
        let mut history = History::empty();
        history.push(0xABCD);
        assert!(history.is_repetition(0xABCD));
        history.pop();
        assert!(!history.is_repetition(0xABCD));
    }

    #[test]
    fn bare_kings_cannot_mate() {
        let board = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(insufficient_material(&board));

        let knight = Board::from_str("4k3/8/8/8/8/8/8/3NK3 w - - 0 1").unwrap();
        assert!(insufficient_material(&knight));

        let rook = Board::from_str("4k3/8/8/8/8/8/8/3RK3 w - - 0 1").unwrap();
        assert!(!insufficient_material(&rook));

        let two_minors = Board::from_str("4k3/8/8/8/8/8/8/2BNK3 w - - 0 1").unwrap();
        assert!(!insufficient_material(&two_minors));
    }
}
