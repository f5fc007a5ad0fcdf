//! Approximate static exchange evaluation.
//!
//! `exchange_value` estimates the material outcome of a capture as
//! `victim - attacker`. This is an intentional approximation: it does not
//! walk the full attacker/defender chain or resolve x-rays. It is used
//! only for move ordering and for delta pruning in quiescence, never as a
//! tactical oracle. A full SEE can replace this function without changing
//! any caller.

use chess::{Board, ChessMove, Piece};

use crate::eval::piece_value;
use crate::score::Cp;

/// Approximate net material gain of `mv` for the side making it.
/// Non-captures score zero unless they promote.
pub fn exchange_value(board: &Board, mv: ChessMove) -> Cp {
    let mut gain = match board.piece_on(mv.get_dest()) {
        Some(victim) => {
            let attacker = board
                .piece_on(mv.get_source())
                .map_or(Cp(0), piece_value);
            piece_value(victim) - attacker
        }
        None => Cp(0),
    };

    if let Some(promotion) = mv.get_promotion() {
        gain += piece_value(promotion) - piece_value(Piece::Pawn);
    }

    gain
}

/// Value of the piece captured by `mv`, plus promotion gain. The most a
/// capture can plausibly win; used by delta pruning.
pub fn capture_gain(board: &Board, mv: ChessMove) -> Cp {
    let mut gain = match board.piece_on(mv.get_dest()) {
        Some(victim) => piece_value(victim),
        None if is_en_passant(board, mv) => piece_value(Piece::Pawn),
        None => Cp(0),
    };
    if let Some(promotion) = mv.get_promotion() {
        gain += piece_value(promotion) - piece_value(Piece::Pawn);
    }
    gain
}

/// Returns true if `mv` captures a piece, en passant included.
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_dest()).is_some() || is_en_passant(board, mv)
}

/// Returns true if `mv` is an en passant capture: a pawn landing on the
/// empty square behind the enemy pawn that just double-stepped.
pub fn is_en_passant(board: &Board, mv: ChessMove) -> bool {
    match board.en_passant() {
        Some(victim) => {
            board.piece_on(mv.get_source()) == Some(Piece::Pawn)
                && mv.get_dest().backward(board.side_to_move()) == Some(victim)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pawn_takes_queen_wins_material() {
        let board = Board::from_str("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mv = ChessMove::from_str("e4d5").unwrap();
        assert_eq!(exchange_value(&board, mv), Cp(800));
    }

    #[test]
    fn queen_takes_pawn_loses_material_on_paper() {
        let board = Board::from_str("4k3/8/p7/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        let capture = ChessMove::from_str("a1a6").unwrap();
        assert_eq!(exchange_value(&board, capture), Cp(100 - 900));

        let quiet = ChessMove::from_str("a1d4").unwrap();
        assert_eq!(exchange_value(&board, quiet), Cp(0));
    }

    #[test]
    fn rook_takes_knight() {
        let board = Board::from_str("4k3/8/8/8/3n4/8/8/3RK3 w - - 0 1").unwrap();
        let mv = ChessMove::from_str("d1d4").unwrap();
        assert_eq!(exchange_value(&board, mv), Cp(320 - 500));
        assert_eq!(capture_gain(&board, mv), Cp(320));
        assert!(is_capture(&board, mv));
    }

    #[test]
    fn en_passant_counts_as_a_capture() {
        // Black just played d7d5; exd6 removes the d-pawn.
        let board = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let ep = ChessMove::from_str("e5d6").unwrap();
        assert!(is_en_passant(&board, ep));
        assert!(is_capture(&board, ep));
        assert_eq!(capture_gain(&board, ep), Cp(100));
        assert_eq!(exchange_value(&board, ep), Cp(0));

        let push = ChessMove::from_str("e5e6").unwrap();
        assert!(!is_capture(&board, push));
    }

    #[test]
    fn promotion_counts_as_gain() {
        let board = Board::from_str("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = ChessMove::new(
            chess::Square::A7,
            chess::Square::A8,
            Some(Piece::Queen),
        );
        assert_eq!(exchange_value(&board, mv), Cp(800));
        assert!(!is_capture(&board, mv));
    }
}
