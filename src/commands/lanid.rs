//! `idmint lanid` command.

use super::generate;
use crate::cli::RecordArgs;
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;
use crate::error::Operation;

/// Execute the `lanid` command. Generate a LANID and email address.
///
/// # Errors
///
/// Returns an error string if the record cannot be built or generation fails.
pub fn run(ctx: &ServiceContext, config: &GeneratorConfig, args: &RecordArgs) -> Result<(), String> {
    generate(ctx, config, args, Operation::Lanid, |orchestrator, record| {
        orchestrator.generate_lanid(record)
    })
}
