//! Centipawn score type and mate-score encoding.
//!
//! All scores inside the search are relative to the side to move at the
//! root of the current (sub)tree. Mate scores carry the distance to mate
//! in their magnitude: a node at ply `p` that is checkmated returns
//! `-(MATE - p)`, so shorter mates always score strictly higher for the
//! winning side.
//!
//! The transposition table stores mate scores relative to the node that
//! produced them, not to the root. [`Cp::to_tt`] and [`Cp::from_tt`] apply
//! this rebase; they are exact inverses and must always be used as a pair.

use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Type alias to make changing the inner score type easy if needed.
pub type CpKind = i32;

/// Centipawn, a common unit of measurement in chess, where 100 Centipawn == 1 Pawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Cp(pub CpKind);

/// The deepest ply the search will ever visit. Also bounds the length of
/// a principal variation.
pub const MAX_PLY: usize = 128;

impl Cp {
    /// Window bound used for alpha/beta initialization. Never a real score.
    pub const INFINITE: Cp = Cp(1_000_000);
    /// Base value of a checkmate found at the root.
    pub const MATE: Cp = Cp(100_000);
    /// Scores with magnitude at or above this are mate scores.
    pub const MATE_BOUND: Cp = Cp(Self::MATE.0 - 2 * MAX_PLY as CpKind);
    /// Score of a drawn position, before contempt.
    pub const DRAW: Cp = Cp(0);

    pub const fn new(value: CpKind) -> Self {
        Self(value)
    }

    pub const fn signum(&self) -> CpKind {
        self.0.signum()
    }

    /// Returns true if this score encodes a forced mate for either side.
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::MATE_BOUND.0
    }

    /// Score for the side to move being checkmated at `ply`.
    pub const fn mated_in(ply: usize) -> Cp {
        Cp(-(Self::MATE.0 - ply as CpKind))
    }

    /// Number of full moves until mate, signed from the score owner's view.
    /// Positive: the scored side delivers mate. None for non-mate scores.
    pub fn mate_in(&self) -> Option<i32> {
        self.is_mate().then(|| {
            let plies = Self::MATE.0 - self.0.abs();
            // Round plies up to full moves.
            ((plies + 1) / 2) * self.signum()
        })
    }

    /// Rebase a root-relative score to a node-relative one for storage in
    /// the transposition table. Exact inverse of [`Cp::from_tt`].
    pub fn to_tt(self, ply: usize) -> Cp {
        if self >= Self::MATE_BOUND {
            self + Cp(ply as CpKind)
        } else if self <= -Self::MATE_BOUND {
            self - Cp(ply as CpKind)
        } else {
            self
        }
    }

    /// Rebase a node-relative transposition table score back to the ply it
    /// is being retrieved at. Exact inverse of [`Cp::to_tt`].
    pub fn from_tt(self, ply: usize) -> Cp {
        if self >= Self::MATE_BOUND {
            self - Cp(ply as CpKind)
        } else if self <= -Self::MATE_BOUND {
            self + Cp(ply as CpKind)
        } else {
            self
        }
    }
}

// Newtype pattern boilerplate.
impl Add for Cp {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl AddAssign for Cp {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
impl Sub for Cp {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}
impl Mul<CpKind> for Cp {
    type Output = Self;
    fn mul(self, rhs: CpKind) -> Self::Output {
        Self(self.0 * rhs)
    }
}
impl Neg for Cp {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Cp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_prefer_shorter_mates() {
        // Mate in k plies scores strictly higher than mate in k+1 plies,
        // for every depth the search can reach.
        for ply in 0..MAX_PLY - 1 {
            let shorter = -Cp::mated_in(ply);
            let longer = -Cp::mated_in(ply + 1);
            assert!(shorter > longer);
            assert!(shorter.is_mate() && longer.is_mate());
        }
    }

    #[test]
    fn tt_rebase_round_trips() {
        let mate_for_us = -Cp::mated_in(7);
        let mate_for_them = Cp::mated_in(4);
        let quiet = Cp(38);

        for ply in [0usize, 1, 5, 64, MAX_PLY - 1] {
            assert_eq!(mate_for_us.to_tt(ply).from_tt(ply), mate_for_us);
            assert_eq!(mate_for_them.to_tt(ply).from_tt(ply), mate_for_them);
            assert_eq!(quiet.to_tt(ply), quiet);
            assert_eq!(quiet.from_tt(ply), quiet);
        }
    }

    #[test]
    fn tt_rebase_is_ply_independent() {
        // A mate stored at one ply and retrieved at another must describe
        // the same mate distance from the retrieval node.
        let store_ply = 6;
        let found = -Cp::mated_in(store_ply + 3); // mate in 3 from that node
        let stored = found.to_tt(store_ply);

        let retrieve_ply = 10;
        let retrieved = stored.from_tt(retrieve_ply);
        assert_eq!(retrieved, -Cp::mated_in(retrieve_ply + 3));
    }

    #[test]
    fn mate_in_full_moves() {
        assert_eq!((-Cp::mated_in(1)).mate_in(), Some(1));
        assert_eq!((-Cp::mated_in(5)).mate_in(), Some(3));
        assert_eq!(Cp::mated_in(2).mate_in(), Some(-1));
        assert_eq!(Cp(120).mate_in(), None);
    }
}
