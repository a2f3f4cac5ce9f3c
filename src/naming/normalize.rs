//! Name canonicalization.
//!
//! Reduces free-form name fragments to uppercase `A`-`Z`. The last name
//! additionally loses Arabic name prefixes and generational suffixes before
//! the character filter runs.

use serde::{Deserialize, Serialize};

/// Leading prefixes removed from last names, matched after uppercasing.
const LAST_NAME_PREFIXES: &[&str] = &["AL-", "BIN-"];

/// Trailing tokens removed from last names, applied once each in this order.
/// A token only matches when preceded by a whitespace character.
const LAST_NAME_SUFFIXES: &[&str] = &["I", "II", "III", "IV", "V", "JR", "SR"];

/// Raw name attributes as read from an identity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    /// Given name.
    pub first: String,
    /// Middle name or initial; empty when absent.
    #[serde(default)]
    pub middle: String,
    /// Family name.
    pub last: String,
}

impl NameParts {
    /// Creates name parts from string slices.
    #[must_use]
    pub fn new(first: &str, middle: &str, last: &str) -> Self {
        Self { first: first.to_string(), middle: middle.to_string(), last: last.to_string() }
    }

    /// Normalizes every component.
    #[must_use]
    pub fn normalize(&self) -> NormalizedName {
        NormalizedName {
            first: normalize(&self.first),
            middle: normalize(&self.middle),
            last: normalize_last_name(&self.last),
        }
    }
}

/// Name components restricted to uppercase ASCII letters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedName {
    /// Normalized given name.
    pub first: String,
    /// Normalized middle name; may be empty.
    pub middle: String,
    /// Normalized family name with prefixes and suffixes removed.
    pub last: String,
}

/// Uppercases `raw` and drops every character outside `A`-`Z`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase().chars().filter(char::is_ascii_uppercase).collect()
}

/// Normalizes a last name, stripping one leading prefix from
/// [`LAST_NAME_PREFIXES`] and each suffix in [`LAST_NAME_SUFFIXES`] before
/// filtering characters.
#[must_use]
pub fn normalize_last_name(raw: &str) -> String {
    let mut name = raw.to_uppercase();

    for prefix in LAST_NAME_PREFIXES {
        if name.starts_with(prefix) {
            name.drain(..prefix.len());
        }
    }

    for suffix in LAST_NAME_SUFFIXES {
        let cut = name.strip_suffix(suffix).and_then(|rest| {
            rest.chars()
                .next_back()
                .filter(|c| c.is_whitespace())
                .map(|ws| rest.len() - ws.len_utf8())
        });
        if let Some(cut) = cut {
            name.truncate(cut);
        }
    }

    normalize(&name)
}
