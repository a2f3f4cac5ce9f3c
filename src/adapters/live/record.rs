//! In-memory identity record.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PortError;
use crate::ports::IdentityRecordStore;

/// Identity record held as a flat attribute map.
///
/// Loaded from and rendered as a YAML map of attribute name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord {
    attributes: BTreeMap<String, String>,
}

impl AttributeRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from name/value pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { attributes: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Loads a record from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read record file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse record file {}: {e}", path.display()))
    }

    /// Renders the record as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(self).map_err(|e| format!("Failed to serialize record: {e}"))
    }

    /// All attributes in name order.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl IdentityRecordStore for AttributeRecord {
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), PortError> {
        self.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
