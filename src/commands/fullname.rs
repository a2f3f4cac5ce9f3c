//! `idmint fullname` command.

use super::generate;
use crate::cli::RecordArgs;
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;
use crate::error::Operation;

/// Execute the `fullname` command. Format the display name.
///
/// # Errors
///
/// Returns an error string if the record cannot be built or generation fails.
pub fn run(ctx: &ServiceContext, config: &GeneratorConfig, args: &RecordArgs) -> Result<(), String> {
    generate(ctx, config, args, Operation::FullName, |orchestrator, record| {
        orchestrator.format_full_name(record)
    })
}
