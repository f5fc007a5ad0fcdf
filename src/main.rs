//! Main UCI interface to the Scout engine.
//!
//! The main thread owns stdin and the engine; each `go` hands a channel
//! to the search worker and a printer thread relays its progress and
//! final best move to stdout.

use std::io;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;

use scout_engine::uci::{UciCommand, UciInfo, UciOption, UciOptions, UciResponse};
use scout_engine::{Cp, EngineBuilder, Mode, SearchUpdate, TranspositionTable};

fn main() -> io::Result<()> {
    env_logger::init();
    println!(
        "Scout {} by {}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    );

    // Engine internal parameters.
    let mut uci_options = UciOptions::new();
    uci_options.insert(UciOption::new_spin(
        "Hash",
        TranspositionTable::DEFAULT_MB as i64,
        1,
        16000,
    ));
    uci_options.insert(UciOption::new_button("Clear Hash"));
    uci_options.insert(UciOption::new_spin("Contempt", 0, -300, 300));
    uci_options.insert(UciOption::new_check("Debug", false));

    let mut engine = EngineBuilder::new()
        .transpositions_mb(uci_options["Hash"].spin().value())
        .build();
    let mut debug = uci_options["Debug"].check().value;

    loop {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        let command = match UciCommand::from_str(&input) {
            Ok(command) => command,
            Err(err) => {
                respond_error(&format!("{} : {}", input.trim().escape_debug(), err))?;
                continue;
            }
        };

        match command {
            // GUI is telling engine to use UCI protocol. Requires a
            // response of id, available options, and acknowledgement.
            UciCommand::Uci => {
                UciResponse::new_id(
                    &format!("Scout {}", env!("CARGO_PKG_VERSION")),
                    env!("CARGO_PKG_AUTHORS"),
                )
                .send()?;
                for option in uci_options.values() {
                    UciResponse::Opt(option.clone()).send()?;
                }
                UciResponse::UciOk.send()?;
            }

            // Sync command; requires acknowledgement.
            UciCommand::IsReady => {
                UciResponse::ReadyOk.send()?;
            }

            // The next search will be from a different game. Learned
            // tables no longer apply.
            UciCommand::UciNewGame => {
                engine.stop();
                engine.wait();
                match engine.new_game() {
                    Ok(()) => respond_debug(debug, "cleared tables for new game")?,
                    Err(err) => respond_error(&err.to_string())?,
                }
            }

            UciCommand::Debug(value) => {
                uci_options["Debug"].check_mut().value = value;
                debug = value;
            }

            // Change an engine internal parameter. Should only be sent
            // while the engine is waiting.
            UciCommand::SetOption(raw_opt) => match uci_options.update(&raw_opt) {
                Ok(option) => {
                    if option.name == "Hash" {
                        let mb = option.spin().value();
                        match engine.try_set_transpositions_mb(mb) {
                            Ok(capacity) => respond_debug(
                                debug,
                                &format!("hash {mb} mb, {capacity} entries"),
                            )?,
                            Err(err) => respond_error(&err.to_string())?,
                        }
                    } else if option.name == "Clear Hash" {
                        option.button_mut().pressed = false;
                        match engine.try_clear_transpositions() {
                            Ok(()) => respond_debug(debug, "hash cleared")?,
                            Err(err) => respond_error(&err.to_string())?,
                        }
                    } else if option.name == "Contempt" {
                        let contempt = Cp(option.spin().value());
                        engine.set_config(engine.config().with_contempt(contempt));
                        respond_debug(debug, &format!("contempt {contempt}"))?;
                    } else if option.name == "Debug" {
                        debug = option.check().value;
                    }
                }
                Err(err) => respond_error(&err.to_string())?,
            },

            // Set the position to search.
            UciCommand::Pos(game) => {
                engine.set_game(game);
            }

            // Begin a search with the provided limits.
            UciCommand::Go(controls) => match Mode::try_from(controls) {
                Ok(mode) => {
                    let (sender, receiver) = mpsc::channel();
                    match engine.search(mode, sender) {
                        Ok(()) => {
                            spawn_printer(receiver);
                        }
                        Err(err) => respond_error(&err.to_string())?,
                    }
                }
                Err(err) => respond_error(&err.to_string())?,
            },

            // Stop any active search as soon as possible. The search
            // worker still reports the best move found so far.
            UciCommand::Stop => {
                engine.stop();
            }

            UciCommand::PonderHit => {}

            UciCommand::Quit => break,
        }
    }

    Ok(())
}

/// Relay search updates to stdout until the search's channel closes.
fn spawn_printer(receiver: mpsc::Receiver<SearchUpdate>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for update in receiver {
            let response = match &update {
                SearchUpdate::Progress(progress) => UciResponse::Info(UciInfo::from(progress)),
                SearchUpdate::Finished(result) => UciResponse::new_best_move(result),
            };
            if let Err(err) = response.send() {
                log::error!("failed to send response: {err}");
            }
        }
    })
}

fn respond_debug(debug: bool, message: &str) -> io::Result<()> {
    if debug {
        UciResponse::InfoString(format!("debug {message}")).send()?;
    }
    log::debug!("{message}");
    Ok(())
}

fn respond_error(message: &str) -> io::Result<()> {
    log::warn!("{message}");
    UciResponse::InfoString(format!("error {message}")).send()
}
