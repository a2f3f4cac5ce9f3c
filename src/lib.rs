//! Core library for the `idmint` identifier generator.
//!
//! Generates unique login identifiers (LANIDs) from a person's name,
//! allocates sequential contractor identifiers (CIDs) from a shared counter,
//! and formats display names, writing the results to an identity record.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod counter;
pub mod error;
pub mod fullname;
pub mod naming;
pub mod orchestrator;
pub mod ports;

use clap::Parser;

pub use config::GeneratorConfig;
pub use error::{ErrorKind, GenerationError, PortError};
pub use orchestrator::{GenerationOrchestrator, GenerationOutcome};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
