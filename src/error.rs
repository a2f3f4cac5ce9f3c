//! Error types for identifier generation and its collaborators.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure reported by an external collaborator (directory, counter store,
/// identity record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortError {
    /// The service could not be reached; the request never took effect.
    Unavailable(String),
    /// The call did not complete within the configured timeout.
    Timeout {
        /// Milliseconds waited before giving up.
        after_ms: u64,
    },
    /// The service answered but refused the request.
    Rejected(String),
    /// The service does not support the requested operation.
    Unsupported(String),
    /// An optimistic update kept losing races with concurrent writers.
    Conflict {
        /// Number of compare-and-replace attempts made.
        attempts: u32,
    },
}

impl PortError {
    /// Builds a timeout error from the elapsed duration.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX) }
    }

    /// Returns `true` for failures worth retrying at the transport level.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "service unavailable: {msg}"),
            Self::Timeout { after_ms } => write!(f, "call timed out after {after_ms}ms"),
            Self::Rejected(msg) => write!(f, "request rejected: {msg}"),
            Self::Unsupported(op) => write!(f, "operation not supported: {op}"),
            Self::Conflict { attempts } => {
                write!(f, "value changed concurrently on each of {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for PortError {}

/// The generation path an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Login identifier generation.
    Lanid,
    /// Contractor identifier allocation.
    Cid,
    /// Display-name formatting.
    FullName,
}

impl Operation {
    /// Short label used in logs and user messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Lanid => "LANID",
            Self::Cid => "CID",
            Self::FullName => "full name",
        }
    }
}

/// The external collaborator involved in a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Identity directory used for uniqueness checks.
    Directory,
    /// Store holding the sequential counter.
    CounterStore,
    /// The identity record being updated.
    IdentityRecord,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::CounterStore => f.write_str("counter store"),
            Self::IdentityRecord => f.write_str("identity record"),
        }
    }
}

/// Caller-facing error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required settings are missing.
    Configuration,
    /// Every permitted candidate was already taken.
    CandidatesExhausted,
    /// A collaborator failed or returned unusable state.
    ExternalService,
}

/// Terminal failure of a generation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Required configuration options are missing or empty.
    Configuration {
        /// The operation that could not run.
        operation: Operation,
        /// Names of the missing options.
        missing: Vec<&'static str>,
    },
    /// No unique candidate was found.
    CandidatesExhausted {
        /// Number of uniqueness checks issued.
        attempts: usize,
    },
    /// A collaborator failed.
    ExternalService {
        /// Which collaborator failed.
        service: Service,
        /// Diagnostic context (environment, counter key, attribute).
        context: String,
        /// The underlying failure.
        source: PortError,
    },
    /// The counter value could not be interpreted or incremented.
    InvalidCounterState {
        /// Rendered counter key.
        key: String,
        /// The raw value read from the store.
        value: String,
    },
}

impl GenerationError {
    /// Maps this error onto its caller-facing class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::CandidatesExhausted { .. } => ErrorKind::CandidatesExhausted,
            Self::ExternalService { .. } | Self::InvalidCounterState { .. } => {
                ErrorKind::ExternalService
            }
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::CandidatesExhausted { .. } => "candidates_exhausted",
            Self::ExternalService { .. } => "external_service",
            Self::InvalidCounterState { .. } => "invalid_counter_state",
        }
    }

    /// Message safe to show an end user. Carries no internal diagnostics.
    #[must_use]
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            Self::Configuration { .. } => format!(
                "{} generation is not configured properly. Property settings are required.",
                operation.label()
            ),
            Self::CandidatesExhausted { .. } => {
                format!("Failed to set {}: no unique value is available.", operation.label())
            }
            Self::ExternalService { .. } | Self::InvalidCounterState { .. } => {
                format!("Failed to set {} for the user.", operation.label())
            }
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { operation, missing } => write!(
                f,
                "{} generation is not configured: missing {}",
                operation.label(),
                missing.join(", ")
            ),
            Self::CandidatesExhausted { attempts } => {
                write!(f, "no unique candidate after {attempts} checks")
            }
            Self::ExternalService { service, context, source } => {
                write!(f, "{service} failure ({context}): {source}")
            }
            Self::InvalidCounterState { key, value } => {
                write!(f, "counter {key} holds invalid value {value:?}")
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ExternalService { source, .. } => Some(source),
            _ => None,
        }
    }
}
