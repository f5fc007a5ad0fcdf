//! Static evaluation.
//!
//! The search consumes evaluation through the [`Evaluate`] trait so the
//! scoring function can be swapped without touching the search core.
//! [`Material`] is the built-in evaluator: material plus piece-square
//! tables plus a small tempo bonus. It is deliberately simple; the search
//! only requires it to be pure, deterministic and bounded.

use chess::{Board, Color, Piece, Square, ALL_PIECES};

use crate::score::Cp;

/// A static evaluator: position in, centipawns out, from the perspective
/// of the side to move. Must be pure and side-effect free.
pub trait Evaluate {
    fn evaluate(&self, board: &Board) -> Cp;

    fn name(&self) -> &'static str {
        "unnamed"
    }
}

/// Color independent base value per piece.
pub const fn piece_value(piece: Piece) -> Cp {
    Cp(match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    })
}

/// Piece-square bonus for a piece of `color` standing on `square`,
/// shared with move ordering for its destination-vs-origin tie-break.
pub fn piece_square(piece: Piece, color: Color, square: Square) -> Cp {
    let index = match color {
        Color::White => square.to_index(),
        // Mirror the board vertically for Black.
        Color::Black => square.to_index() ^ 56,
    };
    let table = match piece {
        Piece::Pawn => &PAWN_TABLE,
        Piece::Knight => &KNIGHT_TABLE,
        Piece::Bishop => &BISHOP_TABLE,
        Piece::Rook => &ROOK_TABLE,
        Piece::Queen => &QUEEN_TABLE,
        Piece::King => &KING_TABLE,
    };
    Cp(table[index])
}

/// Material + piece-square evaluator.
#[derive(Debug, Default, Copy, Clone)]
pub struct Material;

/// Bonus for having the move.
const TEMPO: Cp = Cp(10);

impl Evaluate for Material {
    fn evaluate(&self, board: &Board) -> Cp {
        let mut white = Cp(0);
        let mut black = Cp(0);

        for piece in ALL_PIECES {
            let bitboard = *board.pieces(piece);
            for square in bitboard & *board.color_combined(Color::White) {
                white += piece_value(piece) + piece_square(piece, Color::White, square);
            }
            for square in bitboard & *board.color_combined(Color::Black) {
                black += piece_value(piece) + piece_square(piece, Color::Black, square);
            }
        }

        let absolute = white - black;
        match board.side_to_move() {
            Color::White => absolute + TEMPO,
            Color::Black => -absolute + TEMPO,
        }
    }

    fn name(&self) -> &'static str {
        "material"
    }
}

// Piece-square tables from White's perspective, A1 = index 0.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn start_position_is_balanced() {
        let eval = Material.evaluate(&Board::default());
        // Only the tempo bonus separates the sides.
        assert_eq!(eval, TEMPO);
    }

    #[test]
    fn evaluation_is_side_to_move_relative() {
        // White is up a rook; good for White to move, bad for Black to move.
        let white_to_move = Board::from_str("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let black_to_move = Board::from_str("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();

        assert!(Material.evaluate(&white_to_move) > Cp(300));
        assert!(Material.evaluate(&black_to_move) < Cp(-300));
    }

    #[test]
    fn queen_outvalues_rook() {
        assert!(piece_value(Piece::Queen) > piece_value(Piece::Rook));
        assert!(piece_value(Piece::Rook) > piece_value(Piece::Bishop));
    }
}
