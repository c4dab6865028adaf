// Multi-keyed card store: an arena of records plus one unique index per key property.
//
// Indices map a key value to a `RecordId`, never to the record itself, so a
// record is a member iff its id sits in every index. Mutations validate first
// and only then touch the indices; a failed call leaves the store unchanged.
// Single-writer: callers sharing a store across threads must lock around it.
use std::collections::HashMap;

use getrandom::fill as fill_random;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::property::Property;
use crate::core::record::Record;

/// Keys used by the interactive session when no deck has been imported.
pub const DEFAULT_KEYS: [Property; 2] = [Property::Term, Property::Definition];

/// Stable handle to a stored record. Stale handles (after removal) resolve to nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RecordId {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    record: Option<Record>,
}

#[derive(Debug)]
pub struct RecordStore {
    keys: Vec<Property>,
    indexes: Vec<HashMap<String, RecordId>>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    order: Vec<RecordId>,
}

impl RecordStore {
    /// Builds an empty store. The first key is the primary key.
    pub fn new(keys: impl IntoIterator<Item = Property>) -> Result<Self> {
        let keys: Vec<Property> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("a store needs at least one key property"));
        }
        for (position, key) in keys.iter().enumerate() {
            if keys[..position].contains(key) {
                return Err(Error::new(ErrorKind::InvalidArgument)
                    .with_message(format!("key property {key} listed twice")));
            }
        }
        Ok(Self::with_keys(keys))
    }

    fn with_keys(keys: Vec<Property>) -> Self {
        let indexes = keys.iter().map(|_| HashMap::new()).collect();
        Self {
            keys,
            indexes,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn keys(&self) -> &[Property] {
        &self.keys
    }

    pub fn primary_key(&self) -> Property {
        self.keys[0]
    }

    pub fn is_key(&self, property: Property) -> bool {
        self.keys.contains(&property)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inserts `record` under every key, or fails with `DuplicateKey` and inserts nothing.
    pub fn add(&mut self, record: Record) -> Result<RecordId> {
        for (key, index) in self.keys.iter().zip(&self.indexes) {
            let value = record.get(*key);
            if index.contains_key(value) {
                return Err(Error::new(ErrorKind::DuplicateKey)
                    .with_message(format!("{key} \"{value}\" already exists")));
            }
        }

        let values: Vec<String> = self
            .keys
            .iter()
            .map(|key| record.get(*key).to_string())
            .collect();
        let id = self.allocate(record);
        for (value, index) in values.into_iter().zip(self.indexes.iter_mut()) {
            index.insert(value, id);
        }
        self.order.push(id);
        tracing::debug!(slot = id.slot, size = self.order.len(), "record added");
        Ok(id)
    }

    /// Removes the record whose `key` equals `value` from every index.
    pub fn remove(&mut self, key: Property, value: &str) -> Result<Record> {
        let id = self.lookup(key, value)?;
        self.remove_id(id)
    }

    pub fn remove_id(&mut self, id: RecordId) -> Result<Record> {
        let slot = self
            .slots
            .get_mut(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .ok_or_else(stale_id)?;
        let record = slot.record.take().ok_or_else(stale_id)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);

        for (key, index) in self.keys.iter().zip(self.indexes.iter_mut()) {
            index.remove(record.get(*key));
        }
        if let Some(position) = self.order.iter().position(|entry| *entry == id) {
            self.order.remove(position);
        }
        tracing::debug!(slot = id.slot, size = self.order.len(), "record removed");
        Ok(record)
    }

    /// Index lookup for key properties, linear scan for the rest.
    pub fn contains(&self, property: Property, value: &str) -> bool {
        self.find(property, value).is_some()
    }

    /// Like [`RecordStore::contains`], returning the first match in primary order.
    pub fn find(&self, property: Property, value: &str) -> Option<RecordId> {
        if let Some(position) = self.key_position(property) {
            return self.indexes[position].get(value).copied();
        }
        self.order.iter().copied().find(|id| {
            self.record(*id)
                .is_some_and(|record| record.get(property) == value)
        })
    }

    /// Snapshot of the record whose `key` equals `value`.
    pub fn get(&self, key: Property, value: &str) -> Result<Record> {
        let id = self.lookup(key, value)?;
        self.record(id).cloned().ok_or_else(stale_id)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.slots
            .get(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    /// Picks a record uniformly at random from the OS random source.
    pub fn sample(&self) -> Result<(RecordId, &Record)> {
        if self.is_empty() {
            return Err(empty_store());
        }
        let index = random_index(self.len())?;
        self.sample_with(|_| index)
    }

    /// Picks the record at `pick(len)` in primary order.
    pub fn sample_with(&self, pick: impl FnOnce(usize) -> usize) -> Result<(RecordId, &Record)> {
        if self.is_empty() {
            return Err(empty_store());
        }
        let index = pick(self.len());
        let id = *self.order.get(index).ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("sample index {index} out of range"))
        })?;
        let record = self.record(id).ok_or_else(stale_id)?;
        Ok((id, record))
    }

    /// Assigns one property of a stored record, re-indexing it when it is a key.
    pub fn set_value(&mut self, id: RecordId, property: Property, value: &str) -> Result<()> {
        let current = self.record(id).ok_or_else(stale_id)?;
        let updated = current.clone().with(property, value);
        let old_value = current.get(property).to_string();
        let new_value = updated.get(property);

        if let Some(position) = self.key_position(property) {
            if new_value != old_value {
                let index = &mut self.indexes[position];
                if index.get(new_value).is_some_and(|other| *other != id) {
                    return Err(Error::new(ErrorKind::DuplicateKey)
                        .with_message(format!("{property} \"{new_value}\" already exists")));
                }
                index.remove(&old_value);
                index.insert(new_value.to_string(), id);
            }
        }

        self.slots[id.slot].record = Some(updated);
        Ok(())
    }

    /// Bumps the failure counter of a stored record and returns the new count.
    pub fn record_failure(&mut self, id: RecordId) -> Result<u32> {
        let failures = self.record(id).ok_or_else(stale_id)?.failures();
        let next = failures.saturating_add(1);
        self.set_value(id, Property::Failure, &next.to_string())?;
        Ok(next)
    }

    /// Clears `property` on every record. Key properties cannot be cleared.
    pub fn reset(&mut self, property: Property) -> Result<()> {
        if self.is_key(property) {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("cannot clear key property {property}")));
        }
        for record in self.slots.iter_mut().filter_map(|slot| slot.record.as_mut()) {
            record.set(property, "");
        }
        Ok(())
    }

    /// Records in primary order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.order.iter().filter_map(|id| self.record(*id))
    }

    fn key_position(&self, property: Property) -> Option<usize> {
        self.keys.iter().position(|key| *key == property)
    }

    fn lookup(&self, key: Property, value: &str) -> Result<RecordId> {
        let position = self.key_position(key).ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("{key} is not a key property"))
        })?;
        self.indexes[position].get(value).copied().ok_or_else(|| {
            Error::new(ErrorKind::NotFound).with_message(format!("no card with {key} \"{value}\""))
        })
    }

    fn allocate(&mut self, record: Record) -> RecordId {
        match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot];
                entry.record = Some(record);
                RecordId {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                RecordId {
                    slot: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::with_keys(DEFAULT_KEYS.to_vec())
    }
}

fn stale_id() -> Error {
    Error::new(ErrorKind::NotFound).with_message("record is no longer in the store")
}

fn empty_store() -> Error {
    Error::new(ErrorKind::NotFound).with_message("the store is empty")
}

fn random_index(bound: usize) -> Result<usize> {
    let bound = bound as u64;
    let zone = (u64::MAX / bound) * bound;
    loop {
        let mut bytes = [0u8; 8];
        fill_random(&mut bytes).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("failed to read random source: {err}"))
        })?;
        let value = u64::from_le_bytes(bytes);
        if value < zone {
            return Ok((value % bound) as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{random_index, RecordStore};
    use crate::core::error::ErrorKind;
    use crate::core::property::Property;
    use crate::core::record::Record;

    fn card(term: &str, definition: &str) -> Record {
        Record::new()
            .with(Property::Term, term)
            .with(Property::Definition, definition)
    }

    fn two_key_store() -> RecordStore {
        RecordStore::new([Property::Term, Property::Definition]).expect("store")
    }

    #[test]
    fn construction_rejects_empty_and_repeated_keys() {
        let err = RecordStore::new([]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = RecordStore::new([Property::Term, Property::Term]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn default_store_keys_on_term_then_definition() {
        let store = RecordStore::default();
        assert_eq!(store.keys(), &[Property::Term, Property::Definition]);
        assert_eq!(store.primary_key(), Property::Term);
        assert!(store.is_empty());
    }

    #[test]
    fn add_duplicate_remove_scenario() {
        let mut store = RecordStore::new([Property::Term]).expect("store");
        store.add(card("hi", "hello")).expect("add");
        assert_eq!(store.len(), 1);

        let err = store.add(card("hi", "other")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(store.len(), 1);

        store.remove(Property::Term, "hi").expect("remove");
        assert_eq!(store.len(), 0);

        let err = store.remove(Property::Term, "hi").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn duplicate_on_secondary_key_inserts_nothing() {
        let mut store = two_key_store();
        store.add(card("dog", "perro")).expect("add");

        let err = store.add(card("hound", "perro")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(Property::Term, "hound"));
    }

    #[test]
    fn remove_clears_every_index() {
        let mut store = two_key_store();
        store.add(card("cat", "gato")).expect("add");
        store.add(card("dog", "perro")).expect("add");

        let removed = store.remove(Property::Definition, "gato").expect("remove");
        assert_eq!(removed.get(Property::Term), "cat");
        assert!(!store.contains(Property::Term, "cat"));
        assert!(!store.contains(Property::Definition, "gato"));
        assert_eq!(store.len(), 1);

        // both values are free again
        store.add(card("cat", "gato")).expect("re-add");
    }

    #[test]
    fn remove_and_get_reject_non_key_properties() {
        let mut store = RecordStore::new([Property::Term]).expect("store");
        store.add(card("a", "b")).expect("add");

        let err = store.remove(Property::Definition, "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = store.get(Property::Definition, "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn contains_scans_non_key_properties() {
        let mut store = RecordStore::new([Property::Term]).expect("store");
        store.add(card("a", "alpha")).expect("add");
        store.add(card("b", "beta")).expect("add");

        assert!(store.contains(Property::Definition, "beta"));
        assert!(!store.contains(Property::Definition, "gamma"));
        assert!(store.contains(Property::Failure, ""));
        let id = store.find(Property::Definition, "beta").expect("find");
        assert_eq!(store.record(id).unwrap().get(Property::Term), "b");
    }

    #[test]
    fn get_returns_a_snapshot() {
        let mut store = two_key_store();
        store.add(card("sun", "sol")).expect("add");

        let mut snapshot = store.get(Property::Term, "sun").expect("get");
        snapshot.set(Property::Definition, "changed");

        assert_eq!(
            store.get(Property::Term, "sun").unwrap().get(Property::Definition),
            "sol"
        );
        assert!(store.contains(Property::Definition, "sol"));
        assert!(!store.contains(Property::Definition, "changed"));
    }

    #[test]
    fn iteration_follows_insertion_with_gaps_closed() {
        let mut store = two_key_store();
        for (term, definition) in [("a", "1"), ("b", "2"), ("c", "3")] {
            store.add(card(term, definition)).expect("add");
        }
        store.remove(Property::Term, "b").expect("remove");
        store.add(card("d", "4")).expect("add");

        let terms: Vec<&str> = store.iter().map(|r| r.get(Property::Term)).collect();
        assert_eq!(terms, ["a", "c", "d"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn stale_ids_do_not_resolve_after_slot_reuse() {
        let mut store = two_key_store();
        let old = store.add(card("x", "1")).expect("add");
        store.remove_id(old).expect("remove");
        let new = store.add(card("y", "2")).expect("add");

        assert_ne!(old, new);
        assert!(store.record(old).is_none());
        assert_eq!(store.remove_id(old).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.record(new).unwrap().get(Property::Term), "y");
    }

    #[test]
    fn sample_with_picks_by_primary_position() {
        let mut store = two_key_store();
        store.add(card("a", "1")).expect("add");
        store.add(card("b", "2")).expect("add");

        let (_, record) = store.sample_with(|len| len - 1).expect("sample");
        assert_eq!(record.get(Property::Term), "b");

        let err = store.sample_with(|len| len).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn sample_on_empty_store_is_not_found() {
        let store = two_key_store();
        assert_eq!(store.sample().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn record_failure_counts_up() {
        let mut store = two_key_store();
        let id = store.add(card("a", "1")).expect("add");
        assert_eq!(store.record_failure(id).unwrap(), 1);
        assert_eq!(store.record_failure(id).unwrap(), 2);
        assert_eq!(store.record(id).unwrap().get(Property::Failure), "2");
    }

    #[test]
    fn set_value_reindexes_keys() {
        let mut store = two_key_store();
        let id = store.add(card("a", "1")).expect("add");
        store.add(card("b", "2")).expect("add");

        store.set_value(id, Property::Term, "z").expect("rename");
        assert!(!store.contains(Property::Term, "a"));
        assert_eq!(store.find(Property::Term, "z"), Some(id));

        let err = store.set_value(id, Property::Definition, "2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(store.record(id).unwrap().get(Property::Definition), "1");
        assert_eq!(store.find(Property::Definition, "1"), Some(id));

        // same value is not a collision with itself
        store.set_value(id, Property::Definition, "1").expect("no-op");
    }

    #[test]
    fn reset_clears_non_key_property_only() {
        let mut store = two_key_store();
        let id = store.add(card("a", "1")).expect("add");
        store.record_failure(id).expect("fail");

        store.reset(Property::Failure).expect("reset");
        assert_eq!(store.record(id).unwrap().failures(), 0);

        let err = store.reset(Property::Term).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn random_index_stays_in_bounds() {
        for bound in [1usize, 2, 3, 7, 100] {
            for _ in 0..50 {
                assert!(random_index(bound).unwrap() < bound);
            }
        }
    }
}
