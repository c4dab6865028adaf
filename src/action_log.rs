//! Purpose: Append-only transcript of a session's console traffic.
//! Exports: `ActionLog`.
//! Role: Collects every prompt, message, and input line so `log` can dump them.
//! Invariants: Entries are stored verbatim; saving concatenates them with no separators.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};

#[derive(Clone, Debug, Default)]
pub struct ActionLog {
    entries: Vec<String>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for entry in &self.entries {
            writer.write_all(entry.as_bytes())?;
        }
        writer.flush()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let io_error = |err: std::io::Error| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write log file")
                .with_path(path)
                .with_source(err)
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(io_error)?;
        tracing::info!(path = %path.display(), entries = self.len(), "log saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ActionLog;
    use crate::core::error::ErrorKind;

    #[test]
    fn entries_concatenate_without_separators() {
        let mut log = ActionLog::new();
        log.record("The card:\n> ");
        log.record("cat\n");
        log.record("no newline");

        let mut out = Vec::new();
        log.write_to(&mut out).expect("write");
        assert_eq!(out, b"The card:\n> cat\nno newline");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn save_writes_file_and_reports_bad_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.log");
        let mut log = ActionLog::new();
        assert!(log.is_empty());
        log.record("hello\n");
        log.save(&path).expect("save");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");

        let err = log.save(&dir.path().join("missing/session.log")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
