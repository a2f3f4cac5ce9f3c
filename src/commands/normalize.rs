//! `idmint normalize` command.

use crate::naming::{normalize, normalize_last_name};

/// Execute the `normalize` command.
pub fn run(value: &str, last: bool) {
    let normalized = if last { normalize_last_name(value) } else { normalize(value) };
    println!("{normalized}");
}
