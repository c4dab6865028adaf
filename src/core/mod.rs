// Core modules: the card schema, the multi-keyed store, the deck codec, and errors.
pub mod codec;
pub mod error;
pub mod property;
pub mod record;
pub mod store;
