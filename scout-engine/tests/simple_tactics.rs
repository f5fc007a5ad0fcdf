//! Simple Tactics
//!
//! Tests to ensure the engine passes basic strength checks.
//! They should find the best move with a small depth.

use std::str::FromStr;

use chess::{ChessMove, Color};
use scout_engine::search::search_to_depth;
use scout_engine::{Game, TranspositionTable};

fn tactic_tester(fen: &str, best_move: &str, depth: u8, winner: Color) {
    let game = Game::from_fen(fen).unwrap();
    let best_move = ChessMove::from_str(best_move).unwrap();
    let mut tt = TranspositionTable::new();

    let result = search_to_depth(&game, depth, &mut tt).unwrap();
    assert_eq!(result.leading(), Some(winner));
    assert_eq!(result.best_move, best_move);
}

#[test]
fn trade_rooks_win_queen() {
    let fen = "7k/6p1/3p3p/p3p3/q3Pp1P/3P1P2/2R5/1rRK2Q1 b - - 8 44";
    tactic_tester(fen, "b1c1", 5, Color::Black);
}

#[test]
fn win_bishop_after_trading_bishop_for_knight() {
    let fen = "r2qk2r/p1pp1ppp/1p2pn2/8/2P1b3/2B5/PPP1QPPP/2KR2NR w kq - 0 11";
    tactic_tester(fen, "c3f6", 5, Color::White);
}

#[test]
fn tempo_on_king_capture_queen() {
    let fen = "4r3/p4ppk/2p5/8/P1pq4/1r2P1P1/4Q2P/R1B3K1 w - - 0 27";
    tactic_tester(fen, "e2h5", 5, Color::White);
}

#[test]
fn underpromote_to_knight_fork_queen() {
    let fen = "5K2/2q1P3/5kp1/7p/8/6PP/8/8 w - - 0 58";
    tactic_tester(fen, "e7e8n", 6, Color::White);
}

#[test]
fn hanging_queen_is_captured() {
    let fen = "4k3/8/1n6/3Q4/8/8/8/4K3 b - - 0 1";
    let game = Game::from_fen(fen).unwrap();
    let mut tt = TranspositionTable::new();

    let result = search_to_depth(&game, 4, &mut tt).unwrap();
    assert_eq!(result.best_move, ChessMove::from_str("b6d5").unwrap());
}
