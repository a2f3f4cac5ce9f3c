//! `idmint candidates` command.

use crate::config::{GeneratorConfig, ShortNamePadding};
use crate::naming::{Candidate, CandidateGenerator, NameParts, MAX_CHECKS};

/// Execute the `candidates` command.
///
/// Prints the normalized name and the candidate of every checked cycle. Cycles that yield
/// nothing usable are shown as `-`. No external service is contacted.
///
/// # Errors
///
/// Returns an error string if no cycle yields a usable candidate.
pub fn run(
    config: &GeneratorConfig,
    first: &str,
    middle: &str,
    last: &str,
    legacy_padding: bool,
) -> Result<(), String> {
    let padding =
        if legacy_padding { ShortNamePadding::LegacyNumeral } else { config.lanid.padding };
    let normalized = NameParts::new(first, middle, last).normalize();
    println!("first:  {}", normalized.first);
    println!("middle: {}", normalized.middle);
    println!("last:   {}", normalized.last);

    let generator = CandidateGenerator::new(normalized, padding);
    if !generator.attempts().any(|a| a.cycle < MAX_CHECKS) {
        return Err("Name yields no usable candidate.".to_string());
    }

    println!("\n{:<5}  CANDIDATE", "CYCLE");
    println!("{:-<5}  {:-<20}", "", "");
    for cycle in 0..MAX_CHECKS {
        let candidate =
            generator.candidate(cycle).map_or_else(|| "-".to_string(), Candidate::into_string);
        println!("{cycle:<5}  {candidate}");
    }
    Ok(())
}
