//! Game state: a base position plus the moves played to reach the
//! current position. The move list is what makes repetition detection
//! possible, since the board model only hashes the current position.

use std::str::FromStr;

use chess::{Board, ChessMove, MoveGen};

use crate::error::{Error, Result};

/// A played game: base position, applied moves, and the resulting board.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    base: Board,
    moves: Vec<ChessMove>,
    board: Board,
}

impl Game {
    /// Create a game from a base position and a list of moves.
    /// Every move is validated against the position it is applied to.
    pub fn new(base: Board, moves: Vec<ChessMove>) -> Result<Self> {
        let mut board = base;
        for mv in &moves {
            if !board.legal(*mv) {
                return Err(Error::IllegalMove(*mv));
            }
            board = board.make_move_new(*mv);
        }
        Ok(Self { base, moves, board })
    }

    /// A game at the standard chess starting position.
    pub fn start_position() -> Self {
        Self::from(Board::default())
    }

    /// Parse a game from a FEN string with no moves applied.
    pub fn from_fen(fen: &str) -> Result<Self> {
        Ok(Self::from(Board::from_str(fen)?))
    }

    /// The current position, after all moves are applied.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The position the game started from.
    pub fn base(&self) -> &Board {
        &self.base
    }

    pub fn moves(&self) -> &[ChessMove] {
        &self.moves
    }

    /// Hashes of every position visited before the current one, oldest
    /// first. Seed material for in-search repetition detection.
    pub fn past_hashes(&self) -> Vec<u64> {
        let mut hashes = Vec::with_capacity(self.moves.len());
        let mut board = self.base;
        for mv in &self.moves {
            hashes.push(board.get_hash());
            board = board.make_move_new(*mv);
        }
        hashes
    }

    /// Number of legal moves in the current position.
    pub fn legal_move_count(&self) -> usize {
        MoveGen::new_legal(&self.board).len()
    }
}

impl From<Board> for Game {
    fn from(board: Board) -> Self {
        Self {
            base: board,
            moves: Vec::new(),
            board,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::start_position()
    }
}
