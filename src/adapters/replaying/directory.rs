//! Replaying adapter for the `DirectoryClient` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::recording::directory::QueryInput;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;
use crate::ports::{DirectoryClient, DirectoryEntry, Filter};

/// Serves recorded directory query results.
pub struct ReplayingDirectory {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingDirectory {
    /// Creates a replaying directory backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl DirectoryClient for ReplayingDirectory {
    fn query(
        &self,
        environment: &str,
        filter: &Filter,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>, PortError> {
        let input = QueryInput { environment, filter: filter.to_string(), attributes };
        let input = serde_json::to_value(&input).expect("query input serializes");
        replay_result(next_output(&self.replayer, "directory", "query", &input))
    }
}
