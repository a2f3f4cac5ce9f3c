//! Adapter implementations for the collaborator ports.
//!
//! `live` talks to real stores, `recording` captures calls into a cassette,
//! and `replaying` serves them back. `guarded` adds timeouts and retries on
//! top of any of them.

pub mod guarded;
pub mod live;
pub mod oracle;
pub mod recording;
pub mod replaying;

pub use guarded::{GuardedCounterStore, GuardedDirectory};
pub use oracle::DirectoryOracle;
