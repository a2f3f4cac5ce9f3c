//! Uniqueness oracle port.

use crate::error::PortError;
use crate::naming::Candidate;

/// Answers whether an identifier is already in use.
///
/// Queries must be idempotent and free of side effects. A failure to answer
/// is reported as an error, never as "unused".
pub trait UniquenessOracle {
    /// Returns `true` if an account already carries `candidate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the authority cannot be queried.
    fn exists(&self, candidate: &Candidate) -> Result<bool, PortError>;
}
