//! Captures interactions and writes them as a cassette file.

use std::path::PathBuf;

use super::format::{Cassette, Interaction, RecordedPolicy};
use crate::config::CallPolicy;

/// Builds a [`Cassette`] in call order and writes it on [`flush`] or
/// [`finish`]. The recording time is taken when the recorder is created.
///
/// [`flush`]: CassetteRecorder::flush
/// [`finish`]: CassetteRecorder::finish
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Creates a recorder that will write to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self { path: path.into(), cassette: Cassette::new(name, source) }
    }

    /// Notes the call policy the recorded ports run under.
    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.cassette.policy = Some(RecordedPolicy::from(policy));
        self
    }

    /// Appends an interaction. Sequence numbers follow call order.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let seq = self.cassette.interactions.len() as u64;
        self.cassette.interactions.push(Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input,
            output,
        });
    }

    /// Number of interactions captured so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cassette.interactions.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cassette.interactions.is_empty()
    }

    /// Writes everything recorded so far, creating parent directories.
    /// May be called repeatedly; each call rewrites the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn flush(&self) -> Result<PathBuf, std::io::Error> {
        let yaml = serde_yaml::to_string(&self.cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }

    /// Writes the cassette and consumes the recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        self.flush()
    }
}
