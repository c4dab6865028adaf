//! Purpose: Interactive review loop over a `RecordStore`.
//! Exports: `Session`, `SessionConfig`, `MENU`, `hardest`.
//! Role: Reads commands line by line, drives the store and codec, writes the dialog.
//! Invariants: Everything written to the output is also appended to the action log.
//! Invariants: Every input line is logged with a trailing newline.
//! Invariants: Store and file errors become one-line messages; only console I/O
//! and random-source failures end `run` with an error.
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::action_log::ActionLog;
use crate::core::codec;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::property::Property;
use crate::core::record::Record;
use crate::core::store::RecordStore;

pub const MENU: &str =
    "Input the action (add, remove, import, export, ask, exit, log, hardest card, reset stats):";

/// Files touched at session start and end.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Deck loaded before the first prompt.
    pub import: Option<PathBuf>,
    /// Deck written on `exit`.
    pub export: Option<PathBuf>,
    /// Transcript written on `exit`.
    pub log: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Command {
    Add,
    Remove,
    Import,
    Export,
    Ask,
    Exit,
    Log,
    HardestCard,
    ResetStats,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let command = match line {
            "add" => Command::Add,
            "remove" => Command::Remove,
            "import" => Command::Import,
            "export" => Command::Export,
            "ask" => Command::Ask,
            "exit" => Command::Exit,
            "log" => Command::Log,
            "hardest card" => Command::HardestCard,
            "reset stats" => Command::ResetStats,
            _ => return None,
        };
        Some(command)
    }
}

/// Highest failure count and the terms that reach it, in primary order.
/// `None` when no card has failed.
pub fn hardest(store: &RecordStore) -> Option<(u32, Vec<&str>)> {
    let max = store.iter().map(Record::failures).max().unwrap_or(0);
    if max == 0 {
        return None;
    }
    let terms = store
        .iter()
        .filter(|record| record.failures() == max)
        .map(|record| record.get(Property::Term))
        .collect();
    Some((max, terms))
}

pub struct Session<R, W> {
    store: RecordStore,
    log: ActionLog,
    config: SessionConfig,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(config: SessionConfig, input: R, output: W) -> Self {
        Self {
            store: RecordStore::default(),
            log: ActionLog::new(),
            config,
            input,
            output,
        }
    }

    pub fn with_store(mut self, store: RecordStore) -> Self {
        self.store = store;
        self
    }

    pub fn into_parts(self) -> (RecordStore, ActionLog, W) {
        (self.store, self.log, self.output)
    }

    /// Runs until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        if let Some(path) = self.config.import.clone() {
            self.import_from(&path)?;
        }
        loop {
            let Some(line) = self.prompt(&format!("{MENU}\n> "))? else {
                tracing::debug!("input closed, exiting");
                return self.exit();
            };
            match Command::parse(&line) {
                Some(Command::Exit) => return self.exit(),
                Some(command) => self.dispatch(command)?,
                None => self.say("Illegal command!\n\n")?,
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::Add => self.add(),
            Command::Remove => self.remove(),
            Command::Ask => self.ask(),
            Command::HardestCard => self.hardest_card(),
            Command::ResetStats => self.reset_stats(),
            Command::Import => match self.prompt("File name:\n> ")? {
                Some(path) => self.import_from(Path::new(&path)),
                None => Ok(()),
            },
            Command::Export => match self.prompt("File name:\n> ")? {
                Some(path) => self.export_to(Path::new(&path)),
                None => Ok(()),
            },
            Command::Log => match self.prompt("File name:\n> ")? {
                Some(path) => self.save_log(Path::new(&path)),
                None => Ok(()),
            },
            Command::Exit => self.exit(),
        }
    }

    fn add(&mut self) -> Result<()> {
        let Some(term) = self.prompt("The card:\n> ")? else {
            return Ok(());
        };
        if self.store.contains(Property::Term, &term) {
            return self.say(&format!("The card \"{term}\" already exists.\n\n"));
        }
        let Some(definition) = self.prompt("The definition of card:\n> ")? else {
            return Ok(());
        };
        if self.store.contains(Property::Definition, &definition) {
            return self.say(&format!("The definition \"{definition}\" already exists.\n\n"));
        }

        let record = Record::new()
            .with(Property::Term, &term)
            .with(Property::Definition, &definition);
        match self.store.add(record) {
            Ok(_) => self.say(&format!(
                "The pair (\"{term}\":\"{definition}\") has been added.\n\n"
            )),
            Err(err) => self.say(&format!("Can't add the card: {}.\n\n", describe(&err))),
        }
    }

    fn remove(&mut self) -> Result<()> {
        let Some(term) = self.prompt("The card:\n> ")? else {
            return Ok(());
        };
        let removed = match self.store.find(Property::Term, &term) {
            Some(id) => self.store.remove_id(id).is_ok(),
            None => false,
        };
        if removed {
            self.say("The card has been removed.\n\n")
        } else {
            self.say(&format!("Can't remove \"{term}\": there is no such card.\n\n"))
        }
    }

    fn ask(&mut self) -> Result<()> {
        if self.store.is_empty() {
            return self.say("There is no card to ask.\n\n");
        }
        let Some(times) = self.prompt("How many times to ask?\n> ")? else {
            return Ok(());
        };
        let rounds = match times.trim().parse::<u32>() {
            Ok(rounds) if rounds > 0 => rounds,
            _ => return self.say("Illegal argument: please enter a positive integer.\n\n"),
        };

        for _ in 0..rounds {
            let (id, term, definition) = {
                let (id, record) = self.store.sample()?;
                (
                    id,
                    record.get(Property::Term).to_string(),
                    record.get(Property::Definition).to_string(),
                )
            };
            let Some(answer) = self.prompt(&format!("Print the definition of \"{term}\":\n> "))?
            else {
                return Ok(());
            };
            if answer.to_lowercase() == definition.to_lowercase() {
                self.say("Correct answer.\n")?;
                continue;
            }

            if let Err(err) = self.store.record_failure(id) {
                tracing::warn!(%err, term = term.as_str(), "failure counter not updated");
            }
            let other = self
                .store
                .find(Property::Definition, &answer)
                .and_then(|other| self.store.record(other))
                .map(|record| record.get(Property::Term).to_string());
            match other {
                Some(other) => self.say(&format!(
                    "Wrong answer. The correct one is \"{definition}\", you've just written the definition of \"{other}\".\n"
                ))?,
                None => self.say(&format!(
                    "Wrong answer. The correct one is \"{definition}\".\n"
                ))?,
            }
        }
        self.say("\n")
    }

    fn hardest_card(&mut self) -> Result<()> {
        let message = match hardest(&self.store) {
            None => "There are no cards with errors.\n\n".to_string(),
            Some((failures, terms)) => {
                let lead = if terms.len() == 1 {
                    "The hardest card is"
                } else {
                    "The hardest cards are"
                };
                let quoted: Vec<String> = terms.iter().map(|term| format!("\"{term}\"")).collect();
                format!(
                    "{lead} {}. You have {failures} errors answering them.\n\n",
                    quoted.join(", ")
                )
            }
        };
        self.say(&message)
    }

    fn reset_stats(&mut self) -> Result<()> {
        match self.store.reset(Property::Failure) {
            Ok(()) => self.say("Card statistics has been reset.\n\n"),
            Err(err) => self.say(&format!("Can't reset stats: {}.\n\n", describe(&err))),
        }
    }

    fn import_from(&mut self, path: &Path) -> Result<()> {
        match codec::import_file(path) {
            Ok(store) => {
                let loaded = store.len();
                self.store = store;
                tracing::info!(path = %path.display(), loaded, "deck imported");
                self.say(&format!("{loaded} cards have been loaded.\n\n"))
            }
            Err(err) if err.kind() == ErrorKind::Io => {
                tracing::info!(%err, "import failed");
                self.say("Import failed: file not found.\n\n")
            }
            Err(err) => {
                tracing::info!(%err, "import failed");
                self.say("Import failed: corrupted import file.\n\n")
            }
        }
    }

    fn export_to(&mut self, path: &Path) -> Result<()> {
        match codec::export_file(path, &self.store) {
            Ok(saved) => {
                tracing::info!(path = %path.display(), saved, "deck exported");
                self.say(&format!("{saved} cards have been saved.\n\n"))
            }
            Err(err) => {
                tracing::info!(%err, "export failed");
                self.say("illegal path.\n\n")
            }
        }
    }

    fn save_log(&mut self, path: &Path) -> Result<()> {
        match self.log.save(path) {
            Ok(()) => self.say("The log has been saved.\n\n"),
            Err(err) => {
                tracing::info!(%err, "log save failed");
                self.say("illegal path.\n\n")
            }
        }
    }

    fn exit(&mut self) -> Result<()> {
        self.say("Bye bye!\n\n")?;
        if let Some(path) = self.config.export.clone() {
            self.export_to(&path)?;
        }
        if let Some(path) = self.config.log.clone() {
            self.save_log(&path)?;
        }
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.say(text)?;
        self.read_line()
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush())
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write to the console")
                    .with_source(err)
            })?;
        self.log.record(text);
        Ok(())
    }

    /// Undecodable bytes become U+FFFD instead of ending the session.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let read = self.input.read_until(b'\n', &mut buf).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read from the console")
                .with_source(err)
        })?;
        if read == 0 {
            return Ok(None);
        }
        let mut line = String::from_utf8_lossy(&buf).into_owned();
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.log.record(format!("{line}\n"));
        Ok(Some(line))
    }
}

fn describe(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}
