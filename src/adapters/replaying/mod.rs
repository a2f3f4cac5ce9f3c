//! Replaying adapters that serve collaborator results from a cassette.

pub mod counter;
pub mod directory;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;

pub use counter::ReplayingCounterStore;
pub use directory::ReplayingDirectory;

/// Fetches the next recorded output for `port`/`method`.
///
/// # Panics
///
/// Panics if the replayer lock is poisoned or the cassette does not match.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
    input: &serde_json::Value,
) -> serde_json::Value {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_output(port, method, input)
}

/// Decodes an `{"Ok": ..}` / `{"Err": ..}` output.
///
/// # Panics
///
/// Panics if the recorded output has neither shape.
pub(crate) fn replay_result<T: DeserializeOwned>(output: serde_json::Value) -> Result<T, PortError> {
    if let Some(err) = output.get("Err") {
        let error: PortError = serde_json::from_value(err.clone())
            .unwrap_or_else(|e| panic!("recorded error does not decode as PortError: {e}"));
        return Err(error);
    }
    let value = output
        .get("Ok")
        .cloned()
        .unwrap_or_else(|| panic!("recorded output has neither Ok nor Err: {output}"));
    Ok(serde_json::from_value(value)
        .unwrap_or_else(|e| panic!("recorded Ok value has the wrong shape: {e}")))
}
