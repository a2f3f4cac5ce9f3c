//! Command dispatch and handlers.

pub mod candidates;
pub mod cid;
pub mod fullname;
pub mod lanid;
pub mod normalize;

use std::env;
use std::path::PathBuf;

use crate::adapters::live::AttributeRecord;
use crate::cli::{Cli, Command, RecordArgs};
use crate::config::GeneratorConfig;
use crate::context::ServiceContext;
use crate::error::{GenerationError, Operation};
use crate::orchestrator::{GenerationOrchestrator, GenerationOutcome};
use crate::ports::IdentityRecordStore;

/// Dispatch a parsed command to its handler.
///
/// `IDMINT_REPLAY=<file>` serves every port call from a cassette;
/// `IDMINT_RECORD=<file>` runs against the live store and records the calls.
///
/// # Errors
///
/// Returns an error string if configuration loading or the command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = GeneratorConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Candidates { first, middle, last, legacy_padding } => {
            candidates::run(&config, first, middle, last, *legacy_padding)
        }
        Command::Normalize { value, last } => {
            normalize::run(value, *last);
            Ok(())
        }
        Command::Lanid(args) => lanid::run(&context(&config)?, &config, args),
        Command::Cid(args) => cid::run(&context(&config)?, &config, args),
        Command::Fullname(args) => fullname::run(&context(&config)?, &config, args),
    }
}

fn context(config: &GeneratorConfig) -> Result<ServiceContext, String> {
    if let Ok(path) = env::var("IDMINT_REPLAY") {
        return ServiceContext::replaying(&PathBuf::from(path));
    }
    if let Ok(path) = env::var("IDMINT_RECORD") {
        return ServiceContext::recording(config, &PathBuf::from(path));
    }
    ServiceContext::live(config)
}

/// Builds the record: file contents, then name flags, then `--set` values.
///
/// # Errors
///
/// Returns an error string if the record file cannot be loaded.
pub fn load_record(args: &RecordArgs, config: &GeneratorConfig) -> Result<AttributeRecord, String> {
    let mut record = match &args.record {
        Some(path) => AttributeRecord::load(path)?,
        None => AttributeRecord::new(),
    };
    let attrs = &config.attributes;
    let names = [
        (&attrs.first_name, &args.first),
        (&attrs.middle_name, &args.middle),
        (&attrs.last_name, &args.last),
    ];
    let assignments = names
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.as_str(), v.as_str())))
        .chain(args.set.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    for (name, value) in assignments {
        record.set_attribute(name, value).map_err(|e| format!("Failed to set {name}: {e}"))?;
    }
    Ok(record)
}

/// Runs one orchestrator operation and prints the resulting record.
fn generate<F>(
    ctx: &ServiceContext,
    config: &GeneratorConfig,
    args: &RecordArgs,
    operation: Operation,
    run: F,
) -> Result<(), String>
where
    F: FnOnce(
        &GenerationOrchestrator<'_>,
        &mut AttributeRecord,
    ) -> Result<GenerationOutcome, GenerationError>,
{
    let mut record = load_record(args, config)?;
    let orchestrator =
        GenerationOrchestrator::new(config, ctx.directory.clone(), ctx.counter.clone());

    match run(&orchestrator, &mut record) {
        Ok(GenerationOutcome::Skipped { attribute, .. }) => {
            eprintln!("{} not generated: {attribute} is already set.", operation.label());
        }
        Ok(GenerationOutcome::Generated(_)) => {}
        Err(err) => return Err(format!("error[{}]: {}", err.code(), err.user_message(operation))),
    }

    print!("{}", record.to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_wins_over_name_flags() {
        let args = RecordArgs {
            first: Some("John".into()),
            last: Some("Doe".into()),
            set: vec![("%LAST_NAME%".into(), "Roe".into())],
            ..RecordArgs::default()
        };
        let record = load_record(&args, &GeneratorConfig::default()).unwrap();
        assert_eq!(record.read("%FIRST_NAME%"), "John");
        assert_eq!(record.read("%LAST_NAME%"), "Roe");
        assert!(!record.has_attribute("eTMiddleInitial"));
    }

    #[test]
    fn record_file_is_the_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.yaml");
        std::fs::write(&path, "\"%FIRST_NAME%\": Jane\n\"%LAST_NAME%\": Roe\n").unwrap();
        let args = RecordArgs { record: Some(path), first: Some("Janet".into()), ..RecordArgs::default() };
        let record = load_record(&args, &GeneratorConfig::default()).unwrap();
        assert_eq!(record.read("%FIRST_NAME%"), "Janet");
        assert_eq!(record.read("%LAST_NAME%"), "Roe");
    }
}
