//! Local directory adapter backed by a YAML store file.
//!
//! Models the slice of an LDAP deployment the engine touches: named
//! environments, entries addressed by DN, multi-valued attributes. Serves both
//! the `DirectoryClient` and `CounterStore` ports. Writes go to a temporary
//! file that is renamed over the store, and the store is re-read before every
//! call so separate processes observe each other's commits.
//!
//! ```yaml
//! environments:
//!   corp:
//!     entries:
//!       - dn: CN=jdoe,OU=Users,DC=corp
//!         attributes:
//!           objectClass: [user]
//!           sAMAccountName: [JDOE]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PortError;
use crate::ports::{CounterStore, DirectoryClient, DirectoryEntry, Filter};

/// Serialized form of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStore {
    /// Environments by name.
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,
}

/// One directory environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Entries in this environment.
    #[serde(default)]
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryStore {
    fn environment(&self, name: &str) -> Result<&Environment, PortError> {
        self.environments
            .get(name)
            .ok_or_else(|| PortError::Unavailable(format!("unknown environment {name:?}")))
    }

    fn entry_mut(&mut self, environment: &str, dn: &str) -> Result<&mut DirectoryEntry, PortError> {
        self.environments
            .get_mut(environment)
            .ok_or_else(|| PortError::Unavailable(format!("unknown environment {environment:?}")))?
            .entries
            .iter_mut()
            .find(|e| e.dn.eq_ignore_ascii_case(dn))
            .ok_or_else(|| PortError::Rejected(format!("no such object {dn:?}")))
    }
}

/// Directory and counter store served from a local YAML file or memory.
pub struct LocalDirectory {
    state: Mutex<DirectoryStore>,
    path: Option<PathBuf>,
}

impl LocalDirectory {
    /// Opens the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Unavailable`] if the file cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self, PortError> {
        let store = read_store(path)?;
        Ok(Self { state: Mutex::new(store), path: Some(path.to_path_buf()) })
    }

    /// Creates a store that lives only in memory.
    #[must_use]
    pub fn in_memory(store: DirectoryStore) -> Self {
        Self { state: Mutex::new(store), path: None }
    }

    /// Returns a copy of the current store contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be re-read.
    pub fn snapshot(&self) -> Result<DirectoryStore, PortError> {
        Ok(self.lock()?.clone())
    }

    /// Locks the state, refreshing it from disk when file-backed.
    fn lock(&self) -> Result<MutexGuard<'_, DirectoryStore>, PortError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| PortError::Unavailable("directory state lock poisoned".into()))?;
        if let Some(path) = &self.path {
            *guard = read_store(path)?;
        }
        Ok(guard)
    }

    fn persist(&self, store: &DirectoryStore) -> Result<(), PortError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(store)
            .map_err(|e| PortError::Rejected(format!("failed to serialize store: {e}")))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, yaml)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|e| PortError::Unavailable(format!("failed to write {}: {e}", path.display())))
    }

    fn set_value(
        &self,
        store: &mut DirectoryStore,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError> {
        let previous = store.clone();
        let entry = store.entry_mut(environment, object)?;
        let key = entry
            .attributes
            .keys()
            .find(|k| k.eq_ignore_ascii_case(attribute))
            .cloned()
            .unwrap_or_else(|| attribute.to_string());
        entry.attributes.insert(key, vec![new_value.to_string()]);
        if let Err(err) = self.persist(store) {
            *store = previous;
            return Err(err);
        }
        debug!(object, attribute, environment, value = new_value, "stored attribute value");
        Ok(())
    }
}

fn read_store(path: &Path) -> Result<DirectoryStore, PortError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PortError::Unavailable(format!("failed to read {}: {e}", path.display())))?;
    serde_yaml::from_str(&content)
        .map_err(|e| PortError::Unavailable(format!("failed to parse {}: {e}", path.display())))
}

impl DirectoryClient for LocalDirectory {
    fn query(
        &self,
        environment: &str,
        filter: &Filter,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>, PortError> {
        let store = self.lock()?;
        let env = store.environment(environment)?;
        Ok(env
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .map(|entry| entry.project(attributes))
            .collect())
    }
}

impl CounterStore for LocalDirectory {
    fn get_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        environment: &str,
    ) -> Result<String, PortError> {
        let mut store = self.lock()?;
        let entry = store.entry_mut(environment, object)?;
        entry
            .values(attribute)
            .first()
            .cloned()
            .ok_or_else(|| PortError::Rejected(format!("{object:?} has no {attribute:?} value")))
    }

    fn replace_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError> {
        let mut store = self.lock()?;
        self.set_value(&mut store, object, attribute, new_value, environment)
    }

    fn compare_and_replace(
        &self,
        object: &str,
        attribute: &str,
        expected: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<bool, PortError> {
        let mut store = self.lock()?;
        let current = store.entry_mut(environment, object)?.values(attribute).first().cloned();
        if current.as_deref() != Some(expected) {
            return Ok(false);
        }
        self.set_value(&mut store, object, attribute, new_value, environment)?;
        Ok(true)
    }
}
