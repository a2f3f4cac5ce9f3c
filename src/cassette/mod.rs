//! YAML cassettes of collaborator interactions, for recording a session
//! against a real store and replaying it deterministically.

pub mod format;
pub mod recorder;
pub mod replayer;
