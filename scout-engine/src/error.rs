//! Engine error type.

use thiserror::Error;

/// Scout engine generic result type.
pub type Result<T> = std::result::Result<T, Error>;

/// A list specifying general errors for the Scout engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was expected following a string key, but none was provided.
    #[error("uci: missing argument after `{0}`")]
    UciNoArgument(String),
    /// A UCI token could not be parsed as an integer.
    #[error("uci: cannot parse integer")]
    UciCannotParseInt(#[from] std::num::ParseIntError),
    /// An unknown UCI command was received.
    #[error("uci: unknown command `{0}`")]
    UciUnknownCommand(String),
    /// An empty UCI command line was received.
    #[error("uci: no command")]
    UciNoCommand,
    /// `debug` was not followed by `on` or `off`.
    #[error("uci: debug requires `on` or `off`")]
    UciDebugIllegalMode,
    /// `setoption` without a name, or with an unknown name.
    #[error("uci: setoption has no valid name")]
    UciSetOptionNoName,
    /// `setoption` value rejected for the named option.
    #[error("uci: option `{0}` cannot take value `{1}`")]
    UciOptionBadValue(String, String),
    /// `position` command malformed.
    #[error("uci: position command malformed")]
    UciPositionMalformed,

    /// A FEN string or move token was rejected by the board model.
    #[error("board: {0}")]
    Board(chess::Error),
    /// A move in a game's move list is not legal from its position.
    #[error("illegal move `{0}` for position")]
    IllegalMove(chess::ChessMove),

    /// Time management mode cannot be created, missing fields.
    #[error("search mode not satisfied by go parameters")]
    ModeNotSatisfied,

    /// The game is already over; there is no move to search for.
    #[error("no legal moves in the searched position")]
    NoLegalMoves,

    /// A search is running and holds the transposition table.
    #[error("engine is currently searching")]
    EngineAlreadySearching,
}

// `chess::Error` (chess 3.2, built on `failure`) does not implement
// `std::error::Error`, so thiserror's `#[from]` cannot be used for it.
impl From<chess::Error> for Error {
    fn from(err: chess::Error) -> Self {
        Error::Board(err)
    }
}
