//! Deterministic candidate sequence for login identifiers.
//!
//! Cycle 0 is `last[..18] + first initial + middle initial`. Each fallback
//! cycle `c` takes `1 + c` letters of the first name and gives up letters of
//! the last name so the result never exceeds [`MAX_LEN`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize::NormalizedName;
use crate::config::ShortNamePadding;

/// Upper bound on candidates per generation (cycles `0..MAX_TRIES`).
pub const MAX_TRIES: u32 = 20;

/// Cycles checked for uniqueness (`0..MAX_CHECKS`). The final generated
/// cycle is never checked.
pub const MAX_CHECKS: u32 = MAX_TRIES - 1;

/// Maximum identifier length accepted by downstream systems.
pub const MAX_LEN: usize = 20;

/// Last-name share of the initial candidate, leaving room for two initials.
const INITIAL_LAST_NAME_LEN: usize = 18;

/// A proposed identifier: 1 to [`MAX_LEN`] uppercase ASCII characters.
///
/// Digits only appear under [`ShortNamePadding::LegacyNumeral`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Candidate(String);

impl Candidate {
    /// Validates `value` as a candidate.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let valid_len = (1..=MAX_LEN).contains(&value.len());
        let valid_chars = value.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        (valid_len && valid_chars).then_some(Self(value))
    }

    /// Returns the candidate text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the candidate, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Candidate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.clone()).ok_or_else(|| format!("invalid candidate {value:?}"))
    }
}

impl From<Candidate> for String {
    fn from(candidate: Candidate) -> Self {
        candidate.0
    }
}

/// A candidate together with the cycle that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// The proposed identifier.
    pub candidate: Candidate,
    /// Position in the fallback sequence, starting at 0.
    pub cycle: u32,
}

/// Pure `cycle -> candidate` function over a normalized name.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    name: NormalizedName,
    padding: ShortNamePadding,
}

impl CandidateGenerator {
    /// Creates a generator for `name`.
    #[must_use]
    pub fn new(name: NormalizedName, padding: ShortNamePadding) -> Self {
        Self { name, padding }
    }

    /// The name candidates are derived from.
    #[must_use]
    pub fn name(&self) -> &NormalizedName {
        &self.name
    }

    /// Candidate for `cycle`, or `None` when the cycle is out of range or the
    /// name yields nothing usable.
    #[must_use]
    pub fn candidate(&self, cycle: u32) -> Option<Candidate> {
        if cycle >= MAX_TRIES {
            return None;
        }
        let raw = if cycle == 0 { self.initial() } else { self.fallback(cycle) };
        Candidate::new(raw)
    }

    /// Every usable candidate in cycle order.
    pub fn attempts(&self) -> impl Iterator<Item = GenerationAttempt> + '_ {
        (0..MAX_TRIES).filter_map(|cycle| {
            self.candidate(cycle).map(|candidate| GenerationAttempt { candidate, cycle })
        })
    }

    fn initial(&self) -> String {
        let mut out = take(&self.name.last, INITIAL_LAST_NAME_LEN);
        out.push_str(&take(&self.name.first, 1));
        out.push_str(&take(&self.name.middle, 1));
        out
    }

    fn fallback(&self, cycle: u32) -> String {
        let cycle = cycle as usize;
        let wanted = 1 + cycle;
        let first_len = self.name.first.chars().count();

        let first_part = if first_len >= wanted {
            take(&self.name.first, wanted)
        } else {
            match self.padding {
                ShortNamePadding::Letters => self.name.first.clone(),
                ShortNamePadding::LegacyNumeral => {
                    format!("{}{}", self.name.first, wanted - first_len)
                }
            }
        };

        let last_cap = (MAX_LEN - cycle).min(MAX_LEN.saturating_sub(first_part.len()));
        let mut out = take(&self.name.last, last_cap);
        out.push_str(&first_part);
        out
    }
}

fn take(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
