//! Cassette data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CallPolicy;

/// One call made to a collaborator port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number across the whole cassette.
    pub seq: u64,
    /// Port name (`directory` or `counter`).
    pub port: String,
    /// Port method invoked.
    pub method: String,
    /// Arguments of the call.
    pub input: serde_json::Value,
    /// Result of the call, as `{"Ok": ..}` or `{"Err": ..}`.
    pub output: serde_json::Value,
}

impl Interaction {
    /// Whether the recorded call failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.output.get("Err").is_some()
    }
}

/// The call policy the recorded ports ran under.
///
/// Recorded results are final: retries happened before the call was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedPolicy {
    /// Per-call timeout in milliseconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Transport retries allowed per call.
    pub retries: u32,
    /// Pause between retries in milliseconds.
    pub backoff_ms: u64,
}

impl From<CallPolicy> for RecordedPolicy {
    fn from(policy: CallPolicy) -> Self {
        let millis = |d: std::time::Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self {
            timeout_ms: policy.timeout.map(millis),
            retries: policy.retries,
            backoff_ms: millis(policy.backoff),
        }
    }
}

/// An ordered recording of collaborator calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording was made.
    pub recorded_at: DateTime<Utc>,
    /// Where the recorded calls went (store path or service label).
    pub source: String,
    /// Call policy in force while recording. Hand-written cassettes omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<RecordedPolicy>,
    /// Calls in the order they were made.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// An empty cassette stamped with the current time.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded_at: Utc::now(),
            source: source.into(),
            policy: None,
            interactions: Vec::new(),
        }
    }

    /// Number of recorded calls that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.interactions.iter().filter(|i| i.failed()).count()
    }

    /// Loads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }
}
