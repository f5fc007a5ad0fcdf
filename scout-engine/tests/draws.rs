//! Draws
//!
//! Tests to ensure repetition and insufficient-material draws are
//! correctly evaluated, and that contempt shifts how the engine values
//! them.

use std::str::FromStr;

use chess::{Board, ChessMove};
use scout_engine::{Cp, Engine, EngineBuilder, Game, Mode, SearchConfig};

/// White has a huge material advantage but black saves the game with
/// perpetual check.
const PERPETUAL_FEN: &str = "k7/1p2QP2/4PP2/8/1P5q/8/6P1/1RRN2K1 b - - 0 1";

fn perpetual_game() -> Game {
    let base = Board::from_str(PERPETUAL_FEN).unwrap();
    let moves = ["h4e1", "g1h2", "e1h4", "h2g1"]
        .iter()
        .map(|s| ChessMove::from_str(s).unwrap())
        .collect();
    Game::new(base, moves).unwrap()
}

#[test]
fn perpetual_check_is_a_draw() {
    let mut engine = EngineBuilder::new()
        .game(perpetual_game())
        .transpositions_mb(2)
        .build();

    let result = engine.search_sync(Mode::depth(5, None)).unwrap();

    // Black keeps checking rather than letting white convert.
    assert_eq!(result.best_move, ChessMove::from_str("h4e1").unwrap());
    assert_eq!(result.leading(), None);
    assert_eq!(result.relative_score(), Cp(0));
}

#[test]
fn contempt_taints_the_draw_score() {
    // With negative contempt the perpetual is still black's best line,
    // but it is no longer scored as dead level.
    let contempt = Cp(-50);
    let mut engine = EngineBuilder::new()
        .game(perpetual_game())
        .transpositions_mb(2)
        .config(SearchConfig::new().with_contempt(contempt))
        .build();

    let result = engine.search_sync(Mode::depth(5, None)).unwrap();
    assert_eq!(result.best_move, ChessMove::from_str("h4e1").unwrap());
    assert_eq!(result.relative_score(), contempt);
}

#[test]
fn bare_minor_piece_cannot_win() {
    // King and knight against king: every line is a draw.
    let game = Game::from_fen("8/8/8/4k3/8/8/3NK3/8 w - - 0 1").unwrap();
    let mut engine = Engine::new();
    engine.set_game(game);

    let result = engine.search_sync(Mode::depth(5, None)).unwrap();
    assert_eq!(result.leading(), None);
    assert_eq!(result.relative_score(), Cp(0));
}

#[test]
fn repetition_detected_within_search_line() {
    // No game history at all: the search discovers the repetition on
    // its own line and still saves black with the perpetual.
    let game = Game::from_fen(PERPETUAL_FEN).unwrap();
    let mut engine = EngineBuilder::new()
        .game(game)
        .transpositions_mb(2)
        .build();

    let result = engine.search_sync(Mode::depth(6, None)).unwrap();
    assert_eq!(result.best_move, ChessMove::from_str("h4e1").unwrap());
    assert!(result.relative_score() >= Cp(0));
}
