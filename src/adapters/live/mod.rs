//! Live adapters backed by real stores.

pub mod directory;
pub mod record;

pub use directory::{DirectoryStore, Environment, LocalDirectory};
pub use record::AttributeRecord;
