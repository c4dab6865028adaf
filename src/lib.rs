//! Purpose: Library crate behind the `flashcards` CLI and its tests.
//! Exports: `core` (schema, store, deck codec, errors), `action_log`, `session`.
//! Role: Everything except argument parsing and process exit lives here.
//! Invariants: The store is single-writer; nothing here spawns threads or locks.
//! Invariants: The library never installs a tracing subscriber.
pub mod action_log;
pub mod core;
pub mod session;

pub use crate::core::error::{Error, ErrorKind, ImportReason, Result, to_exit_code};
pub use crate::core::property::Property;
pub use crate::core::record::Record;
pub use crate::core::store::{RecordId, RecordStore};
