//! Engine struct acts as a simplified API over game state, search and the
//! tables that persist between searches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::eval::{Evaluate, Material};
use crate::game::Game;
use crate::moveorder::MoveOrderer;
use crate::search::{self, SearchResult, SearchUpdate};
use crate::timeman::Mode;
use crate::transposition::TranspositionTable;

/// EngineBuilder sets the parameters of an Engine once, up front, so the
/// costly pieces (the transposition table above all) are allocated once.
///
/// Default values:
///
/// * `game`: starting chess position
/// * `transpositions_mb`: 16 megabytes
/// * `config`: default search configuration
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    game: Game,
    transpositions_mb: usize,
    config: SearchConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            game: Game::start_position(),
            transpositions_mb: TranspositionTable::DEFAULT_MB,
            config: SearchConfig::new(),
        }
    }

    /// Create and return a new Engine.
    pub fn build(&self) -> Engine {
        Engine {
            game: self.game.clone(),
            config: self.config,
            evaluator: Arc::new(Material),
            tt: Arc::new(Mutex::new(TranspositionTable::with_mb(
                self.transpositions_mb,
            ))),
            orderer: Arc::new(Mutex::new(MoveOrderer::new())),
            stopper: Arc::new(AtomicBool::new(false)),
            search_handle: None,
        }
    }

    /// Set the Engine's initial game state.
    pub fn game(mut self, game: Game) -> Self {
        self.game = game;
        self
    }

    /// Set the engine's initial transposition table size in megabytes.
    pub fn transpositions_mb(mut self, transpositions_mb: usize) -> Self {
        self.transpositions_mb = transpositions_mb;
        self
    }

    /// Set the engine's initial search configuration.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine wraps up everything a search needs: the game being played, the
/// search configuration, and the tables that carry knowledge from one
/// search into the next. It is stateful because evaluating a chess
/// position correctly requires the history of the current game.
///
/// If a new game is going to be started, the engine needs to be told so.
pub struct Engine {
    // Search fields
    game: Game,
    config: SearchConfig,
    evaluator: Arc<dyn Evaluate + Send + Sync>,
    tt: Arc<Mutex<TranspositionTable>>,
    orderer: Arc<Mutex<MoveOrderer>>,
    stopper: Arc<AtomicBool>,

    // Meta fields
    search_handle: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    /// Returns reference to the engine's current game.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Returns a copy of the engine's search configuration.
    pub fn config(&self) -> SearchConfig {
        self.config
    }

    /// Set the game or position to search.
    pub fn set_game<T: Into<Game>>(&mut self, game: T) {
        self.game = game.into();
    }

    /// Replace the search configuration. Takes effect on the next search.
    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
    }

    /// Informs engine that the next search is from a new game: learned
    /// tables and cached positions no longer apply.
    /// Fails if a search is using the tables.
    pub fn new_game(&mut self) -> Result<()> {
        self.try_clear_transpositions()?;
        self.orderer
            .try_lock()
            .map(|mut orderer| orderer.clear())
            .map_err(|_| Error::EngineAlreadySearching)
    }

    /// Attempt to resize the transposition table to `new_mb` megabytes,
    /// dropping its contents. Fails while a search holds the table.
    /// Returns the new capacity in entries.
    pub fn try_set_transpositions_mb(&mut self, new_mb: usize) -> Result<usize> {
        self.tt
            .try_lock()
            .map(|mut tt| tt.set_mb(new_mb))
            .map_err(|_| Error::EngineAlreadySearching)
    }

    /// Attempt to clear the transposition table.
    /// Fails while a search holds the table.
    pub fn try_clear_transpositions(&mut self) -> Result<()> {
        self.tt
            .try_lock()
            .map(|mut tt| tt.clear())
            .map_err(|_| Error::EngineAlreadySearching)
    }

    /// Run a blocking search, returning its final result.
    pub fn search_sync(&mut self, mode: Mode) -> Result<SearchResult> {
        // Block until any running search winds down.
        self.stop();
        self.wait();
        self.unstop();

        let (sender, receiver) = mpsc::channel();
        self.search(mode, sender)?;
        self.wait();

        // The worker has exited, so the channel ends after its messages.
        let mut finished = None;
        while let Ok(update) = receiver.recv() {
            if let SearchUpdate::Finished(result) = update {
                finished = Some(result);
            }
        }
        finished.ok_or(Error::NoLegalMoves)
    }

    /// Run a non-blocking search. Progress reports and the final result
    /// arrive over `sender`.
    ///
    /// The engine runs one search at a time; starting a second while one
    /// is active fails. A game-over position fails up front with
    /// [`Error::NoLegalMoves`] rather than starting a search that cannot
    /// produce a move.
    pub fn search(&mut self, mode: Mode, sender: Sender<SearchUpdate>) -> Result<()> {
        if self.search_handle.is_some() {
            return Err(Error::EngineAlreadySearching);
        }
        if self.game.legal_move_count() == 0 {
            return Err(Error::NoLegalMoves);
        }
        self.unstop();

        let handle = search::search_nonblocking(
            self.game.clone(),
            mode,
            self.config,
            Arc::clone(&self.evaluator),
            Arc::clone(&self.tt),
            Arc::clone(&self.orderer),
            Arc::clone(&self.stopper),
            sender,
        );
        self.search_handle = Some(handle);
        Ok(())
    }

    /// Informs the active search to stop as soon as possible.
    pub fn stop(&self) {
        self.stopper.store(true, Ordering::Relaxed);
    }

    /// Resets the stop flag.
    pub fn unstop(&self) {
        self.stopper.store(false, Ordering::Relaxed);
    }

    /// Blocks until the active search, if any, has completed.
    pub fn wait(&mut self) {
        if let Some(handle) = self.search_handle.take() {
            if handle.join().is_err() {
                log::error!("search worker panicked before finishing");
            }
        }
    }

    /// Returns true if the engine is ready to start a search.
    /// Only one search may run at a time.
    pub fn ready(&self) -> bool {
        self.search_handle.is_none()
    }

    /// Transposition table fill level in permille, for `info hashfull`.
    /// Reports zero while a search holds the table.
    pub fn hashfull(&self) -> usize {
        self.tt
            .try_lock()
            .map(|tt| tt.load_factor())
            .unwrap_or_else(|err| match err {
                std::sync::TryLockError::Poisoned(poisoned) => {
                    PoisonError::into_inner(poisoned).load_factor()
                }
                std::sync::TryLockError::WouldBlock => 0,
            })
    }

    /// Consumes and shuts down the Engine, stopping any active search.
    /// Dropping the engine does the same; this makes it explicit.
    pub fn shutdown(self) {}
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}
