//! Drives the candidate sequence against a uniqueness oracle.

use tracing::debug;

use super::candidates::{CandidateGenerator, GenerationAttempt, MAX_CHECKS};
use crate::error::PortError;
use crate::ports::UniquenessOracle;

/// Controller state. `Accepted`, `Exhausted` and `ServiceFailed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to derive the candidate for `cycle`.
    Generating {
        /// Next cycle to generate.
        cycle: u32,
    },
    /// Waiting on the oracle for this attempt.
    Checking(GenerationAttempt),
    /// The attempt's candidate is unused.
    Accepted(GenerationAttempt),
    /// Every cycle was tried.
    Exhausted {
        /// Uniqueness checks issued.
        checks: usize,
    },
    /// The oracle failed; no further cycles run.
    ServiceFailed {
        /// Attempt being checked when the failure occurred.
        attempt: GenerationAttempt,
        /// The oracle failure.
        error: PortError,
    },
}

/// Why a run ended without an accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryFailure {
    /// All cycles collided.
    Exhausted {
        /// Uniqueness checks issued.
        checks: usize,
    },
    /// The oracle could not answer.
    ServiceFailed {
        /// Attempt being checked when the failure occurred.
        attempt: GenerationAttempt,
        /// The oracle failure.
        error: PortError,
    },
}

/// Stateful driver pairing a [`CandidateGenerator`] with an oracle.
///
/// Issues at most [`MAX_CHECKS`] checks per run. Cycles whose candidate is
/// empty are skipped without a check. Repeated candidates are checked again.
pub struct RetryController<'a> {
    generator: &'a CandidateGenerator,
}

impl<'a> RetryController<'a> {
    /// Creates a controller over `generator`.
    #[must_use]
    pub fn new(generator: &'a CandidateGenerator) -> Self {
        Self { generator }
    }

    /// Runs from cycle 0 until a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`RetryFailure::Exhausted`] when no candidate was unique and
    /// [`RetryFailure::ServiceFailed`] as soon as the oracle errors.
    pub fn run(&self, oracle: &dyn UniquenessOracle) -> Result<GenerationAttempt, RetryFailure> {
        let mut checks = 0usize;
        let mut state = RetryState::Generating { cycle: 0 };

        loop {
            state = match state {
                RetryState::Generating { cycle } if cycle >= MAX_CHECKS => {
                    RetryState::Exhausted { checks }
                }
                RetryState::Generating { cycle } => match self.generator.candidate(cycle) {
                    Some(candidate) => {
                        debug!(cycle, candidate = %candidate, "generated candidate");
                        RetryState::Checking(GenerationAttempt { candidate, cycle })
                    }
                    None => {
                        debug!(cycle, "cycle produced no usable candidate");
                        RetryState::Generating { cycle: cycle + 1 }
                    }
                },
                RetryState::Checking(attempt) => {
                    checks += 1;
                    match oracle.exists(&attempt.candidate) {
                        Ok(false) => RetryState::Accepted(attempt),
                        Ok(true) => {
                            debug!(cycle = attempt.cycle, candidate = %attempt.candidate, "candidate taken");
                            RetryState::Generating { cycle: attempt.cycle + 1 }
                        }
                        Err(error) => RetryState::ServiceFailed { attempt, error },
                    }
                }
                RetryState::Accepted(attempt) => return Ok(attempt),
                RetryState::Exhausted { checks } => return Err(RetryFailure::Exhausted { checks }),
                RetryState::ServiceFailed { attempt, error } => {
                    return Err(RetryFailure::ServiceFailed { attempt, error })
                }
            };
        }
    }
}
