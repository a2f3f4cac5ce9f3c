//! `idmint cid` command.

use super::generate;
use crate::cli::RecordArgs;
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;
use crate::error::Operation;

/// Execute the `cid` command. Allocate the next CID.
///
/// # Errors
///
/// Returns an error string if the record cannot be built or generation fails.
pub fn run(ctx: &ServiceContext, config: &GeneratorConfig, args: &RecordArgs) -> Result<(), String> {
    generate(ctx, config, args, Operation::Cid, |orchestrator, record| {
        orchestrator.generate_cid(record)
    })
}
