// A single card: one string value per property.
use crate::core::property::Property;

/// Card values, indexed by [`Property`].
///
/// Stored values never contain line breaks; the deck format is line-oriented
/// and relies on it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Record {
    values: [String; Property::COUNT],
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, property: Property, value: impl AsRef<str>) -> Self {
        self.set(property, value);
        self
    }

    pub fn get(&self, property: Property) -> &str {
        &self.values[property.slot()]
    }

    pub fn set(&mut self, property: Property, value: impl AsRef<str>) {
        self.values[property.slot()] = strip_line_breaks(value.as_ref());
    }

    /// The failure counter. Empty or unparseable values count as zero.
    pub fn failures(&self) -> u32 {
        let raw = self.get(Property::Failure).trim();
        if raw.is_empty() {
            return 0;
        }
        match raw.parse() {
            Ok(count) => count,
            Err(_) => {
                tracing::warn!(value = raw, "unparseable failure counter, treating as 0");
                0
            }
        }
    }
}

fn strip_line_breaks(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}
