// Deck file format: a four-line header followed by one line per card value.
//
//   Card Collections
//   <record count>
//   <key property names>
//   <all property names>
//   <value lines, Property::COUNT per record>
//
// Import validates every header assumption and either yields a complete store
// or an `Import` error; no partially loaded store escapes.
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind, ImportReason, Result};
use crate::core::property::Property;
use crate::core::record::Record;
use crate::core::store::RecordStore;

pub const HEADER: &str = "Card Collections";

/// Renders `store` in deck format, records in primary order.
pub fn serialize(store: &RecordStore) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&store.len().to_string());
    out.push('\n');
    push_names(&mut out, store.keys());
    push_names(&mut out, &Property::ALL);
    for record in store.iter() {
        for property in Property::ALL {
            out.push_str(record.get(property));
            out.push('\n');
        }
    }
    out
}

fn push_names(out: &mut String, properties: &[Property]) {
    let names: Vec<&str> = properties.iter().map(|property| property.name()).collect();
    out.push_str(&names.join(" "));
    out.push('\n');
}

/// Writes `store` to `writer` and returns the number of records written.
pub fn write_store<W: Write>(store: &RecordStore, writer: &mut W) -> Result<usize> {
    writer.write_all(serialize(store).as_bytes()).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write deck")
            .with_source(err)
    })?;
    Ok(store.len())
}

pub fn read_store<R: Read>(mut reader: R) -> Result<RecordStore> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read deck")
            .with_source(err)
    })?;
    let text = String::from_utf8(bytes)
        .map_err(|err| Error::import(ImportReason::Encoding).with_source(err))?;
    deserialize(&text)
}

/// Parses a deck. The resulting store is keyed exactly as the key line says.
pub fn deserialize(text: &str) -> Result<RecordStore> {
    let result = parse(text);
    if let Err(err) = &result {
        tracing::warn!(reason = ?err.reason(), line = ?err.line(), "deck rejected");
    }
    result
}

fn parse(text: &str) -> Result<RecordStore> {
    let mut lines = text
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .map(|(index, line)| (index + 1, line));
    let mut header_line = || {
        lines
            .next()
            .map(|(_, line)| line)
            .ok_or_else(|| Error::import(ImportReason::MissingHeader))
    };

    if header_line()? != HEADER {
        return Err(Error::import(ImportReason::WrongHeader).with_line(1));
    }
    let count: usize = header_line()?
        .trim()
        .parse()
        .map_err(|err| Error::import(ImportReason::InvalidCount).with_line(2).with_source(err))?;
    let keys = parse_key_line(header_line()?).map_err(|err| err.with_line(3))?;
    let properties = parse_property_line(header_line()?).map_err(|err| err.with_line(4))?;

    let mut store = RecordStore::new(keys)
        .map_err(|err| Error::import(ImportReason::DuplicateKeyProperty).with_source(err))?;
    let mut last_line = 4;
    for _ in 0..count {
        let mut record = Record::new();
        for property in &properties {
            let (number, value) = lines
                .next()
                .ok_or_else(|| Error::import(ImportReason::Truncated).with_line(last_line + 1))?;
            record.set(*property, value);
            last_line = number;
        }
        store.add(record).map_err(|err| {
            Error::import(ImportReason::DuplicateRecord)
                .with_line(last_line)
                .with_source(err)
        })?;
    }
    tracing::debug!(records = store.len(), keys = ?store.keys(), "deck parsed");
    Ok(store)
}

// Single spaces separate names; older writers left one trailing space.
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(' ').split(' ')
}

fn parse_names(line: &str, repeated: ImportReason) -> Result<Vec<Property>> {
    let mut properties = Vec::new();
    for token in tokens(line) {
        let property = Property::from_name(token).ok_or_else(|| {
            Error::import(ImportReason::UnknownProperty)
                .with_message(format!("unknown property name \"{token}\""))
        })?;
        if properties.contains(&property) {
            return Err(Error::import(repeated));
        }
        properties.push(property);
    }
    Ok(properties)
}

fn parse_key_line(line: &str) -> Result<Vec<Property>> {
    parse_names(line, ImportReason::DuplicateKeyProperty)
}

fn parse_property_line(line: &str) -> Result<Vec<Property>> {
    if tokens(line).count() != Property::COUNT {
        return Err(Error::import(ImportReason::PropertyCountMismatch));
    }
    parse_names(line, ImportReason::DuplicateProperty)
}

/// Writes `store` to `path`, replacing any existing file.
pub fn export_file(path: &Path, store: &RecordStore) -> Result<usize> {
    let file = File::create(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to create deck file")
            .with_path(path)
            .with_source(err)
    })?;
    let mut writer = BufWriter::new(file);
    let written = write_store(store, &mut writer).map_err(|err| err.with_path(path))?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush deck file")
            .with_path(path)
            .with_source(err)
    })?;
    tracing::debug!(path = %path.display(), records = written, "deck exported");
    Ok(written)
}

pub fn import_file(path: &Path) -> Result<RecordStore> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to open deck file")
            .with_path(path)
            .with_source(err)
    })?;
    read_store(file).map_err(|err| err.with_path(path))
}
