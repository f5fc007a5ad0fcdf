//! Universal Chess Interface.
//!
//! Parsing of GUI-to-engine commands and rendering of engine-to-GUI
//! responses. This module owns the wire format only; the stdin loop and
//! the engine live in the binary.

use std::collections::HashMap;
use std::fmt::{self, Display, Write as FmtWrite};
use std::hash::{Hash, Hasher};
use std::io;
use std::ops::{Deref, Index, IndexMut};
use std::str::{FromStr, SplitWhitespace};
use std::time::Duration;

use chess::{Board, ChessMove};

use crate::error::{Error, Result};
use crate::game::Game;
use crate::score::Cp;
use crate::search::{display_line, SearchProgress, SearchResult};

/// Commands an external program sends to this engine.
#[derive(Debug, Clone, PartialEq)]
pub enum UciCommand {
    Uci,
    Debug(bool),
    IsReady,
    SetOption(RawOption),
    UciNewGame,
    Pos(Game),
    Go(SearchControls),
    Stop,
    PonderHit,
    Quit,
}

impl UciCommand {
    /// Parse a single input line into a UciCommand if possible.
    pub fn parse_command(input_str: &str) -> Result<Self> {
        let mut input = input_str.split_whitespace();
        let head = input.next().ok_or(Error::UciNoCommand)?;

        match head {
            "uci" => Ok(UciCommand::Uci),
            "debug" => Self::parse_debug(input),
            "isready" => Ok(UciCommand::IsReady),
            "setoption" => Self::parse_setoption(input),
            "ucinewgame" => Ok(UciCommand::UciNewGame),
            "position" => Self::parse_pos(input),
            "go" => Self::parse_go(input),
            "stop" => Ok(UciCommand::Stop),
            "ponderhit" => Ok(UciCommand::PonderHit),
            "quit" => Ok(UciCommand::Quit),
            other => Err(Error::UciUnknownCommand(other.to_string())),
        }
    }

    /// command: `debug [on | off]`
    fn parse_debug(mut input: SplitWhitespace) -> Result<Self> {
        match input.next() {
            Some("on") => Ok(Self::Debug(true)),
            Some("off") => Ok(Self::Debug(false)),
            _ => Err(Error::UciDebugIllegalMode),
        }
    }

    /// command: `setoption name <id> [value <x>]`
    fn parse_setoption(mut input: SplitWhitespace) -> Result<Self> {
        if input.next() != Some("name") {
            return Err(Error::UciSetOptionNoName);
        }

        // The id runs until the token `value` or end of input.
        let mut name = String::new();
        let mut had_value = false;
        for token in input.by_ref() {
            if token == "value" {
                had_value = true;
                break;
            }
            name.push_str(token);
            name.push(' ');
        }
        name.pop();
        if name.is_empty() {
            return Err(Error::UciSetOptionNoName);
        }

        let mut value = String::new();
        if had_value {
            for token in input {
                value.push_str(token);
                value.push(' ');
            }
            value.pop();
            if value.is_empty() {
                return Err(Error::UciNoArgument("value".to_string()));
            }
        }

        Ok(UciCommand::SetOption(RawOption {
            name: name.as_str().into(),
            value,
        }))
    }

    /// command: `position [fen <fen> | startpos] [moves <move>...]`
    fn parse_pos(mut input: SplitWhitespace) -> Result<Self> {
        let base = match input.next() {
            Some("startpos") => Board::default(),
            Some("fen") => {
                let mut fen = String::new();
                for _ in 0..6 {
                    fen.push_str(input.next().ok_or(Error::UciPositionMalformed)?);
                    fen.push(' ');
                }
                Board::from_str(fen.trim())?
            }
            _ => return Err(Error::UciPositionMalformed),
        };

        let mut moves = Vec::new();
        if let Some("moves") = input.next() {
            for move_str in input {
                moves.push(ChessMove::from_str(move_str)?);
            }
        }

        Game::new(base, moves).map(UciCommand::Pos)
    }

    /// command: `go [wtime|btime|winc|binc|movestogo|depth|movetime <n> | infinite | ponder]*`
    fn parse_go(mut input: SplitWhitespace) -> Result<Self> {
        let mut controls = SearchControls::new();

        while let Some(token) = input.next() {
            match token {
                "infinite" => controls.infinite = true,
                "ponder" => {}
                "wtime" | "btime" | "winc" | "binc" | "movestogo" | "depth" | "movetime"
                | "nodes" | "mate" => {
                    let argument: u64 = input
                        .next()
                        .ok_or_else(|| Error::UciNoArgument(token.to_string()))?
                        .parse()?;

                    match token {
                        "wtime" => controls.wtime = Some(Duration::from_millis(argument)),
                        "btime" => controls.btime = Some(Duration::from_millis(argument)),
                        "winc" => controls.winc = Some(Duration::from_millis(argument)),
                        "binc" => controls.binc = Some(Duration::from_millis(argument)),
                        "movestogo" => controls.moves_to_go = Some(argument as u32),
                        "depth" => controls.depth = Some(argument.min(u8::MAX as u64) as u8),
                        "movetime" => controls.move_time = Some(Duration::from_millis(argument)),
                        // Accepted for protocol compatibility, not used to
                        // limit the search.
                        "nodes" | "mate" => {}
                        _ => unreachable!(),
                    }
                }
                other => return Err(Error::UciUnknownCommand(other.to_string())),
            }
        }

        Ok(UciCommand::Go(controls))
    }
}

impl FromStr for UciCommand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse_command(s)
    }
}

/// Search limits parsed from a `go` command. Converted to a
/// [`crate::timeman::Mode`] before searching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct SearchControls {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub moves_to_go: Option<u32>,
    pub depth: Option<u8>,
    pub move_time: Option<Duration>,
    pub infinite: bool,
}

impl SearchControls {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Engine to external program communication.
#[derive(Debug, Clone)]
pub enum UciResponse {
    Id(String, String),
    UciOk,
    ReadyOk,
    Opt(UciOption),
    BestMove(ChessMove, Option<ChessMove>),
    Info(UciInfo),
    InfoString(String),
}

impl UciResponse {
    pub fn new_id(name: &str, author: &str) -> Self {
        Self::Id(name.into(), author.into())
    }

    pub fn new_best_move(result: &SearchResult) -> Self {
        Self::BestMove(result.best_move, result.ponder)
    }

    /// Send this response over stdout.
    pub fn send(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        <io::StdoutLock as io::Write>::write_all(&mut handle, self.to_string().as_ref())?;
        <io::StdoutLock as io::Write>::flush(&mut handle)
    }
}

impl Display for UciResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Id(name, author) => {
                writeln!(f, "id name {name}")?;
                writeln!(f, "id author {author}")
            }
            Self::UciOk => f.write_str("uciok\n"),
            Self::ReadyOk => f.write_str("readyok\n"),
            Self::Opt(option) => writeln!(f, "{option}"),
            Self::BestMove(best, ponder) => {
                write!(f, "bestmove {best}")?;
                if let Some(ponder) = ponder {
                    write!(f, " ponder {ponder}")?;
                }
                f.write_char('\n')
            }
            Self::Info(info) => writeln!(f, "{info}"),
            Self::InfoString(message) => writeln!(f, "info string {message}"),
        }
    }
}

/// An `info` line describing a completed search iteration.
#[derive(Debug, Clone)]
pub struct UciInfo {
    pub depth: u8,
    pub score: Cp,
    pub time_ms: u128,
    pub nodes: u64,
    pub nps: u64,
    pub hashfull: usize,
    pub pv: String,
}

impl From<&SearchProgress> for UciInfo {
    fn from(progress: &SearchProgress) -> Self {
        let secs = progress.elapsed.as_secs_f64();
        let nps = if secs > 0.0 {
            (progress.nodes as f64 / secs) as u64
        } else {
            0
        };
        Self {
            depth: progress.depth,
            score: progress.score,
            time_ms: progress.elapsed.as_millis(),
            nodes: progress.nodes,
            nps,
            hashfull: progress.hashfull,
            pv: display_line(&progress.pv),
        }
    }
}

impl Display for UciInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "info depth {}", self.depth)?;
        // Mate scores render as distance in full moves, others as cp.
        match self.score.mate_in() {
            Some(moves) => write!(f, " score mate {moves}")?,
            None => write!(f, " score cp {}", self.score)?,
        }
        write!(
            f,
            " time {} nodes {} nps {} hashfull {}",
            self.time_ms, self.nodes, self.nps, self.hashfull
        )?;
        if !self.pv.is_empty() {
            write!(f, " pv {}", self.pv)?;
        }
        Ok(())
    }
}

/// Type parsed from a `setoption` command. The value is stringly typed
/// because it can be a string, bool, integer, or nothing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawOption {
    pub name: CaselessString,
    pub value: String,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Check {
    pub value: bool,
    pub default: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Spin {
    pub value: i64,
    pub default: i64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Button {
    pub pressed: bool,
}

impl Spin {
    /// Spin holds an i64 to cover any numeric input; this converts to the
    /// intended type. Panics if the value does not fit, which the min/max
    /// bounds are expected to prevent.
    pub fn value<T: TryFrom<i64>>(&self) -> T {
        match T::try_from(self.value) {
            Ok(converted) => converted,
            _ => panic!("spin value TryFrom<i64> conversion failed"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum UciOptionType {
    Check(Check),
    Spin(Spin),
    Button(Button),
}

impl Display for UciOptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UciOptionType::Check(Check { default, .. }) => {
                write!(f, "type check default {default}")
            }
            UciOptionType::Spin(Spin {
                default, min, max, ..
            }) => {
                write!(f, "type spin default {default} min {min} max {max}")
            }
            UciOptionType::Button(_) => f.write_str("type button"),
        }
    }
}

/// A configurable engine parameter announced in response to `uci`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UciOption {
    pub name: CaselessString,
    pub option_type: UciOptionType,
}

impl UciOption {
    pub fn new_check(name: &str, default: bool) -> Self {
        Self {
            name: name.into(),
            option_type: UciOptionType::Check(Check {
                value: default,
                default,
            }),
        }
    }

    pub fn new_spin(name: &str, default: i64, min: i64, max: i64) -> Self {
        assert!(min < max, "illegal spin, min >= max");
        assert!((min..=max).contains(&default), "illegal spin default");

        Self {
            name: name.into(),
            option_type: UciOptionType::Spin(Spin {
                value: default,
                default,
                min,
                max,
            }),
        }
    }

    pub fn new_button(name: &str) -> Self {
        Self {
            name: name.into(),
            option_type: UciOptionType::Button(Button { pressed: false }),
        }
    }

    /// Inner Check of this option. Panics if the option is another type.
    pub fn check(&self) -> &Check {
        match self.option_type {
            UciOptionType::Check(ref check) => check,
            _ => panic!("option type is not check"),
        }
    }

    /// Inner Spin of this option. Panics if the option is another type.
    pub fn spin(&self) -> &Spin {
        match self.option_type {
            UciOptionType::Spin(ref spin) => spin,
            _ => panic!("option type is not spin"),
        }
    }

    /// Inner Check of this option, mutably. Panics if the option is
    /// another type.
    pub fn check_mut(&mut self) -> &mut Check {
        match self.option_type {
            UciOptionType::Check(ref mut check) => check,
            _ => panic!("option type is not check"),
        }
    }

    /// Inner Button of this option. Panics if the option is another type.
    pub fn button_mut(&mut self) -> &mut Button {
        match self.option_type {
            UciOptionType::Button(ref mut button) => button,
            _ => panic!("option type is not button"),
        }
    }

    /// Try to apply the stringly-typed value of `raw_opt` to this option.
    /// Returns a mutable reference to self on successful update.
    pub fn try_update(&mut self, raw_opt: &RawOption) -> Result<&mut Self> {
        if self.name != raw_opt.name {
            return Err(Error::UciSetOptionNoName);
        }
        let name = self.name.to_string();
        let reject = || Error::UciOptionBadValue(name.clone(), raw_opt.value.clone());

        match self.option_type {
            UciOptionType::Check(Check { ref mut value, .. }) => {
                *value = bool::from_str(&raw_opt.value).map_err(|_| reject())?;
            }
            UciOptionType::Spin(Spin {
                ref mut value,
                min,
                max,
                ..
            }) => {
                let new_value: i64 = raw_opt.value.parse().map_err(|_| reject())?;
                if !(min..=max).contains(&new_value) {
                    return Err(reject());
                }
                *value = new_value;
            }
            UciOptionType::Button(Button { ref mut pressed }) => *pressed = true,
        }

        Ok(self)
    }
}

impl Display for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "option name {} {}", self.name.0, self.option_type)
    }
}

/// String wrapper that compares and hashes with casing and surrounding
/// whitespace ignored, retaining the original casing for display.
#[derive(Debug, Clone)]
pub struct CaselessString(String);

impl PartialEq for CaselessString {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }
}
impl Eq for CaselessString {}

impl PartialEq<&str> for CaselessString {
    fn eq(&self, other: &&str) -> bool {
        self.0.to_lowercase() == other.to_lowercase()
    }
}

impl Hash for CaselessString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_lowercase().hash(state);
    }
}

impl Deref for CaselessString {
    type Target = String;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for CaselessString {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl Display for CaselessString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type OptionsMap = HashMap<CaselessString, UciOption>;

/// The set of options this engine announces, keyed by caseless name.
/// An option can only be updated with a value of its own type.
#[derive(Default)]
pub struct UciOptions(OptionsMap);

impl UciOptions {
    pub fn new() -> Self {
        Self(OptionsMap::new())
    }

    /// Store an option under its own name, replacing any previous entry.
    pub fn insert(&mut self, uci_opt: UciOption) -> Option<UciOption> {
        let key = uci_opt.name.clone();
        let old_value = self.0.remove(&key);
        self.0.insert(key, uci_opt);
        old_value
    }

    /// Attempt to update a stored option from a parsed `setoption`.
    /// This never creates a new entry. Returns a mutable reference to
    /// the updated option.
    pub fn update(&mut self, raw_opt: &RawOption) -> Result<&mut UciOption> {
        self.0
            .get_mut(&raw_opt.name)
            .ok_or(Error::UciSetOptionNoName)?
            .try_update(raw_opt)
    }
}

impl<K: Into<CaselessString>> Index<K> for UciOptions {
    type Output = UciOption;
    fn index(&self, key: K) -> &Self::Output {
        let key: CaselessString = key.into();
        &self.0[&key]
    }
}

impl<K: Into<CaselessString>> IndexMut<K> for UciOptions {
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        let key: CaselessString = key.into();
        self.0.get_mut(&key).expect("key not present")
    }
}

impl Deref for UciOptions {
    type Target = OptionsMap;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_singles() {
        let pairs = [
            ("uci", UciCommand::Uci),
            ("isready\n", UciCommand::IsReady),
            ("ucinewgame", UciCommand::UciNewGame),
            ("stop", UciCommand::Stop),
            ("ponderhit", UciCommand::PonderHit),
            ("quit", UciCommand::Quit),
        ];
        for (input, expected) in pairs {
            assert_eq!(UciCommand::parse_command(input).unwrap(), expected);
        }
    }

    #[test]
    fn parse_command_debug() {
        assert_eq!(
            UciCommand::parse_command("debug on").unwrap(),
            UciCommand::Debug(true)
        );
        assert_eq!(
            UciCommand::parse_command("debug off").unwrap(),
            UciCommand::Debug(false)
        );
        assert!(UciCommand::parse_command("debug sideways").is_err());
    }

    #[test]
    fn parse_command_setoption() {
        let command = UciCommand::parse_command("setoption name Hash value 100\n").unwrap();
        let raw = RawOption {
            name: "hash".into(),
            value: String::from("100"),
        };
        assert_eq!(command, UciCommand::SetOption(raw));

        let command = UciCommand::parse_command("setoption name Clear Hash \n").unwrap();
        let raw = RawOption {
            name: "Clear Hash".into(),
            value: String::new(),
        };
        assert_eq!(command, UciCommand::SetOption(raw));
    }

    #[test]
    fn parse_command_pos() {
        let command = UciCommand::parse_command("position startpos moves d2d4 d7d5").unwrap();
        let d4 = ChessMove::from_str("d2d4").unwrap();
        let d5 = ChessMove::from_str("d7d5").unwrap();
        let game = Game::new(Board::default(), vec![d4, d5]).unwrap();
        assert_eq!(command, UciCommand::Pos(game));

        let fen = "rnbqkbnr/pppp1ppp/8/4P3/8/8/PPP1PPPP/RNBQKBNR b KQkq - 0 2";
        let command = UciCommand::parse_command(&format!("position fen {fen}")).unwrap();
        let game = Game::from_fen(fen).unwrap();
        assert_eq!(command, UciCommand::Pos(game));

        assert!(UciCommand::parse_command("position startpos moves e2e5").is_err());
    }

    #[test]
    fn parse_command_go() {
        let command = UciCommand::parse_command("go depth 10 wtime 40000 \n").unwrap();
        let mut controls = SearchControls::new();
        controls.depth = Some(10);
        controls.wtime = Some(Duration::from_millis(40000));
        assert_eq!(command, UciCommand::Go(controls));

        let command = UciCommand::parse_command("go infinite").unwrap();
        assert!(matches!(
            command,
            UciCommand::Go(SearchControls { infinite: true, .. })
        ));
    }

    #[test]
    fn options_insert_update() {
        let mut options = UciOptions::new();
        options.insert(UciOption::new_spin("Hash", 16, 1, 16000));
        options.insert(UciOption::new_button("Clear Hash"));

        let raw = RawOption {
            name: "hash".into(),
            value: "14".into(),
        };
        assert!(options.update(&raw).is_ok());
        assert_eq!(options["Hash"].spin().value, 14);

        let out_of_range = RawOption {
            name: "hash".into(),
            value: "99999999".into(),
        };
        assert!(options.update(&out_of_range).is_err());
    }

    #[test]
    fn info_line_renders_mate_and_cp() {
        let mut info = UciInfo {
            depth: 8,
            score: Cp(34),
            time_ms: 1500,
            nodes: 100_000,
            nps: 66_666,
            hashfull: 120,
            pv: "e2e4 e7e5".to_string(),
        };
        assert_eq!(
            info.to_string(),
            "info depth 8 score cp 34 time 1500 nodes 100000 nps 66666 hashfull 120 pv e2e4 e7e5"
        );

        info.score = -Cp::mated_in(3);
        assert!(info.to_string().contains("score mate 2"));
    }
}
