// The fixed card schema shared by records, the store, and the deck format.
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

/// A field every card carries. Declaration order is the on-disk order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Property {
    Term,
    Definition,
    Failure,
}

impl Property {
    pub const ALL: [Property; 3] = [Property::Term, Property::Definition, Property::Failure];
    pub const COUNT: usize = Self::ALL.len();

    pub fn name(self) -> &'static str {
        match self {
            Property::Term => "TERM",
            Property::Definition => "DEFINITION",
            Property::Failure => "FAILURE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.name() == name)
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value).ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("unknown property \"{value}\""))
        })
    }
}
