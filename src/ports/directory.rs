//! Directory port for querying the identity system of record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PortError;

/// An object in the directory: a DN plus multi-valued attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attribute values keyed by attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Values of `name`, matched case-insensitively.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Copy of this entry restricted to `names`. An empty list keeps all
    /// attributes.
    #[must_use]
    pub fn project(&self, names: &[String]) -> Self {
        if names.is_empty() {
            return self.clone();
        }
        let attributes = self
            .attributes
            .iter()
            .filter(|(key, _)| names.iter().any(|n| n.eq_ignore_ascii_case(key)))
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        Self { dn: self.dn.clone(), attributes }
    }
}

/// Search filter. Renders as RFC 4515 text for logs and cassettes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Attribute has a value equal to `value` (case-insensitive).
    Equals {
        /// Attribute name.
        attribute: String,
        /// Asserted value.
        value: String,
    },
    /// Every sub-filter matches.
    And(Vec<Filter>),
}

impl Filter {
    /// Equality assertion.
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals { attribute: attribute.into(), value: value.into() }
    }

    /// Evaluates the filter against `entry`.
    #[must_use]
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Self::Equals { attribute, value } => {
                entry.values(attribute).iter().any(|v| v.eq_ignore_ascii_case(value))
            }
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { attribute, value } => {
                write!(f, "({attribute}=")?;
                for c in value.chars() {
                    match c {
                        '*' => f.write_str("\\2a")?,
                        '(' => f.write_str("\\28")?,
                        ')' => f.write_str("\\29")?,
                        '\\' => f.write_str("\\5c")?,
                        '\0' => f.write_str("\\00")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str(")")
            }
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Read access to the identity directory.
pub trait DirectoryClient: Send + Sync {
    /// Returns every entry in `environment` matching `filter`, restricted to
    /// `attributes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is unknown or unreachable.
    fn query(
        &self,
        environment: &str,
        filter: &Filter,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>, PortError>;
}
