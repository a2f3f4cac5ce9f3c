//! Login identifier synthesis: normalization, candidate sequence, and the
//! retry driver that checks candidates for uniqueness.

pub mod candidates;
pub mod normalize;
pub mod retry;

pub use candidates::{Candidate, CandidateGenerator, GenerationAttempt, MAX_CHECKS, MAX_LEN, MAX_TRIES};
pub use normalize::{normalize, normalize_last_name, NameParts, NormalizedName};
pub use retry::{RetryController, RetryFailure, RetryState};
