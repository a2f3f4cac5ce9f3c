//! Service context bundling the collaborator ports.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::LocalDirectory;
use crate::adapters::recording::{RecordingCounterStore, RecordingDirectory};
use crate::adapters::replaying::{ReplayingCounterStore, ReplayingDirectory};
use crate::adapters::{GuardedCounterStore, GuardedDirectory};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::{CallPolicy, GeneratorConfig};
use crate::error::PortError;
use crate::ports::{CounterStore, DirectoryClient, DirectoryEntry, Filter};

/// The directory and counter ports used by one CLI invocation.
///
/// Constructors wire live, recording or replaying adapters. Live and
/// recording contexts wrap every port in the configured [`CallPolicy`].
pub struct ServiceContext {
    /// Directory used for uniqueness checks.
    pub directory: Arc<dyn DirectoryClient>,
    /// Store holding the CID counter.
    pub counter: Arc<dyn CounterStore>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context over the store named by `DIRECTORY_STORE`.
    ///
    /// Without a store, every port call fails as unavailable, which still
    /// lets configuration errors surface first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be opened.
    pub fn live(config: &GeneratorConfig) -> Result<Self, String> {
        let (directory, counter) = open_store(config)?;
        let (directory, counter) = guard(directory, counter, config.call_policy);
        Ok(Self { directory, counter, recorder: None })
    }

    /// Creates a live context that records every port call to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be opened.
    pub fn recording(config: &GeneratorConfig, path: &Path) -> Result<Self, String> {
        let source = config
            .directory_store
            .as_deref()
            .map_or_else(|| "unconfigured".to_string(), |p| p.display().to_string());
        let (directory, counter) = open_store(config)?;
        Ok(Self::recording_over(directory, counter, config.call_policy, path, source))
    }

    /// Guards `directory` and `counter` with `policy` and records the
    /// guarded calls to `path`.
    ///
    /// The cassette holds the result each caller saw after retries, so a
    /// replay of it ends the same way the recorded run did.
    #[must_use]
    pub fn recording_over(
        directory: Arc<dyn DirectoryClient>,
        counter: Arc<dyn CounterStore>,
        policy: CallPolicy,
        path: &Path,
        source: impl Into<String>,
    ) -> Self {
        let recorder = CassetteRecorder::new(path, "idmint-session", source).with_policy(policy);
        let recorder = Arc::new(Mutex::new(recorder));
        let (directory, counter) = guard(directory, counter, policy);
        let directory: Arc<dyn DirectoryClient> =
            Arc::new(RecordingDirectory::new(directory, Arc::clone(&recorder)));
        let counter: Arc<dyn CounterStore> =
            Arc::new(RecordingCounterStore::new(counter, Arc::clone(&recorder)));
        Self { directory, counter, recorder: Some(recorder) }
    }

    /// Creates a context served entirely from the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        Ok(Self::from_cassette(&cassette))
    }

    /// Creates a replaying context from an in-memory cassette.
    #[must_use]
    pub fn from_cassette(cassette: &Cassette) -> Self {
        info!(
            name = %cassette.name,
            interactions = cassette.interactions.len(),
            failures = cassette.failures(),
            "replaying cassette"
        );
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(cassette)));
        Self {
            directory: Arc::new(ReplayingDirectory::new(Arc::clone(&replayer))),
            counter: Arc::new(ReplayingCounterStore::new(replayer)),
            recorder: None,
        }
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let Ok(recorder) = recorder.lock() else {
            warn!("cassette recorder lock poisoned, cassette not written");
            return;
        };
        match recorder.flush() {
            Ok(path) => info!(path = %path.display(), "cassette written"),
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}

fn open_store(
    config: &GeneratorConfig,
) -> Result<(Arc<dyn DirectoryClient>, Arc<dyn CounterStore>), String> {
    let Some(path) = &config.directory_store else {
        let directory: Arc<dyn DirectoryClient> = Arc::new(MissingStore);
        let counter: Arc<dyn CounterStore> = Arc::new(MissingStore);
        return Ok((directory, counter));
    };
    let store = Arc::new(
        LocalDirectory::open(path)
            .map_err(|e| format!("Failed to open directory store {}: {e}", path.display()))?,
    );
    let directory: Arc<dyn DirectoryClient> = store.clone();
    let counter: Arc<dyn CounterStore> = store;
    Ok((directory, counter))
}

fn guard(
    directory: Arc<dyn DirectoryClient>,
    counter: Arc<dyn CounterStore>,
    policy: CallPolicy,
) -> (Arc<dyn DirectoryClient>, Arc<dyn CounterStore>) {
    let directory: Arc<dyn DirectoryClient> = Arc::new(GuardedDirectory::new(directory, policy));
    let counter: Arc<dyn CounterStore> = Arc::new(GuardedCounterStore::new(counter, policy));
    (directory, counter)
}

/// Stand-in used when no directory store is configured.
struct MissingStore;

impl MissingStore {
    fn error() -> PortError {
        PortError::Unavailable("DIRECTORY_STORE is not set".into())
    }
}

impl DirectoryClient for MissingStore {
    fn query(&self, _: &str, _: &Filter, _: &[String]) -> Result<Vec<DirectoryEntry>, PortError> {
        Err(Self::error())
    }
}

impl CounterStore for MissingStore {
    fn get_attribute_value(&self, _: &str, _: &str, _: &str) -> Result<String, PortError> {
        Err(Self::error())
    }

    fn replace_attribute_value(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), PortError> {
        Err(Self::error())
    }
}
