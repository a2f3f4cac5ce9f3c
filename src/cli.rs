//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `idmint`.
#[derive(Debug, Parser)]
#[command(name = "idmint", version, about = "Generate login and contractor identifiers")]
pub struct Cli {
    /// YAML properties file; environment variables override its values.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a unique LANID and email address for a record.
    Lanid(RecordArgs),
    /// Allocate the next CID for a record.
    Cid(RecordArgs),
    /// Format the display name for a record.
    Fullname(RecordArgs),
    /// Print the candidate sequence for a name without querying anything.
    Candidates {
        /// Given name.
        #[arg(long)]
        first: String,
        /// Middle name.
        #[arg(long, default_value = "")]
        middle: String,
        /// Family name.
        #[arg(long)]
        last: String,
        /// Pad short first names with the legacy numeral shortfall.
        #[arg(long)]
        legacy_padding: bool,
    },
    /// Print a normalized name fragment.
    Normalize {
        /// The raw name fragment.
        value: String,
        /// Apply last-name prefix and suffix removal.
        #[arg(long)]
        last: bool,
    },
}

/// Identity record inputs shared by the generating commands.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    /// YAML record file with the starting attributes.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,
    /// Given name.
    #[arg(long)]
    pub first: Option<String>,
    /// Middle name.
    #[arg(long)]
    pub middle: Option<String>,
    /// Family name.
    #[arg(long)]
    pub last: Option<String>,
    /// Set an attribute before running; repeatable.
    #[arg(long = "set", value_name = "ATTR=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) =
        raw.split_once('=').ok_or_else(|| format!("expected ATTR=VALUE, got {raw:?}"))?;
    if name.is_empty() {
        return Err(format!("missing attribute name in {raw:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}
