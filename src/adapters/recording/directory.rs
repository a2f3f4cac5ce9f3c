//! Recording adapter for the `DirectoryClient` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::PortError;
use crate::ports::{DirectoryClient, DirectoryEntry, Filter};

/// Records directory queries while delegating to an inner client.
pub struct RecordingDirectory {
    inner: Arc<dyn DirectoryClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingDirectory {
    /// Wraps `inner`, appending every query to `recorder`.
    pub fn new(inner: Arc<dyn DirectoryClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// Recorded arguments of a directory query. The filter is stored in its
/// LDAP text form.
#[derive(Serialize)]
pub(crate) struct QueryInput<'a> {
    pub(crate) environment: &'a str,
    pub(crate) filter: String,
    pub(crate) attributes: &'a [String],
}

impl DirectoryClient for RecordingDirectory {
    fn query(
        &self,
        environment: &str,
        filter: &Filter,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>, PortError> {
        let result = self.inner.query(environment, filter, attributes);
        let input = QueryInput { environment, filter: filter.to_string(), attributes };
        record_result(&self.recorder, "directory", "query", &input, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::{DirectoryStore, LocalDirectory};
    use crate::cassette::format::Cassette;

    #[test]
    fn records_query_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "memory")));

        {
            let mut store = DirectoryStore::default();
            store.environments.insert("corp".into(), crate::adapters::live::Environment::default());
            let directory = RecordingDirectory::new(
                Arc::new(LocalDirectory::in_memory(store)),
                Arc::clone(&recorder),
            );
            let filter = Filter::equals("sAMAccountName", "DOEJ");
            assert!(directory.query("corp", &filter, &[]).unwrap().is_empty());
            assert!(directory.query("lab", &filter, &[]).is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].input["filter"], "(sAMAccountName=DOEJ)");
        assert!(cassette.interactions[0].output.get("Ok").is_some());
        assert!(cassette.interactions[1].output["Err"].get("Unavailable").is_some());
    }
}
