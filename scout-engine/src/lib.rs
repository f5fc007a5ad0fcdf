//! Scout chess engine library.
//!
//! The crate is organized around a small number of collaborators: the
//! board and rules model comes from the `chess` crate, [`game`] carries a
//! position together with the moves that reached it, [`search`] holds the
//! iterative-deepening NegaScout core, and [`engine`] wraps everything in
//! a stateful API suitable for a UCI frontend.

pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod exchange;
pub mod game;
pub mod moveorder;
pub mod score;
pub mod search;
pub mod timeman;
pub mod transposition;
pub mod uci;

pub use config::SearchConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};
pub use eval::{Evaluate, Material};
pub use game::Game;
pub use moveorder::MoveOrderer;
pub use score::Cp;
pub use search::{SearchResult, SearchUpdate};
pub use timeman::Mode;
pub use transposition::TranspositionTable;
