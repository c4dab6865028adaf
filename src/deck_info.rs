//! Purpose: Summaries of a deck file for `flashcards inspect`.
//! Exports: `DeckInfo`, `deck_info`, `deck_info_json`, `deck_info_text`.
//! Role: One summary shape rendered either as JSON or as human text.
//! Invariants: JSON key names are stable; `hardest` is omitted when no card has failed.
use std::path::Path;
use std::time::SystemTime;

use flashcards::session::hardest;
use flashcards::RecordStore;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Serialize)]
pub(crate) struct DeckInfo {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub cards: usize,
    pub keys: Vec<&'static str>,
    pub failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardest: Option<HardestCards>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HardestCards {
    pub errors: u32,
    pub terms: Vec<String>,
}

pub(crate) fn deck_info(path: &Path, store: &RecordStore) -> DeckInfo {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(format_time);
    DeckInfo {
        path: path.display().to_string(),
        modified,
        cards: store.len(),
        keys: store.keys().iter().map(|key| key.name()).collect(),
        failures: store.iter().map(|record| u64::from(record.failures())).sum(),
        hardest: hardest(store).map(|(errors, terms)| HardestCards {
            errors,
            terms: terms.into_iter().map(str::to_string).collect(),
        }),
    }
}

fn format_time(time: SystemTime) -> Option<String> {
    OffsetDateTime::from(time).format(&Rfc3339).ok()
}

pub(crate) fn deck_info_json(info: &DeckInfo) -> Value {
    serde_json::to_value(info).unwrap_or(Value::Null)
}

pub(crate) fn deck_info_text(info: &DeckInfo) -> String {
    let mut lines = vec![
        format!("path: {}", info.path),
        format!("cards: {}", info.cards),
        format!("keys: {}", info.keys.join(" ")),
        format!("failures: {}", info.failures),
    ];
    if let Some(modified) = &info.modified {
        lines.insert(1, format!("modified: {modified}"));
    }
    match &info.hardest {
        Some(hardest) => lines.push(format!(
            "hardest: {} ({} errors)",
            hardest.terms.join(", "),
            hardest.errors
        )),
        None => lines.push("hardest: none".to_string()),
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
