//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the generation engine and a
//! system it does not own (identity directory, counter store, identity
//! record). Implementations live in `src/adapters/`.

pub mod counter;
pub mod directory;
pub mod identity;
pub mod oracle;

pub use counter::CounterStore;
pub use directory::{DirectoryClient, DirectoryEntry, Filter};
pub use identity::IdentityRecordStore;
pub use oracle::UniquenessOracle;
