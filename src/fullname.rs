//! Display-name formatting from a placeholder template.

use crate::config::FullNameSettings;
use crate::naming::NameParts;

/// Placeholder for the first name.
pub const FIRST_PLACEHOLDER: &str = "<<first>>";
/// Placeholder for the middle name or initial.
pub const MIDDLE_PLACEHOLDER: &str = "<<middle>>";
/// Placeholder for the last name.
pub const LAST_PLACEHOLDER: &str = "<<last>>";

/// Returns `true` when `existing` should be replaced by a generated name:
/// it is empty or the literal `default`, ignoring case.
#[must_use]
pub fn needs_full_name(existing: &str) -> bool {
    existing.is_empty() || existing.eq_ignore_ascii_case("default")
}

/// Fills the template in `settings` with the trimmed name parts.
///
/// With `use_initial` set, the middle name is reduced to its first
/// character. The result is trimmed, so `"<<last>>, <<first>> <<middle>>"`
/// without a middle name yields `"Smith, John"`.
#[must_use]
pub fn format_full_name(settings: &FullNameSettings, name: &NameParts) -> String {
    let middle = name.middle.trim();
    let middle = if settings.use_initial {
        middle.chars().next().map(String::from).unwrap_or_default()
    } else {
        middle.to_string()
    };

    settings
        .format
        .replace(FIRST_PLACEHOLDER, name.first.trim())
        .replace(MIDDLE_PLACEHOLDER, &middle)
        .replace(LAST_PLACEHOLDER, name.last.trim())
        .trim()
        .to_string()
}
