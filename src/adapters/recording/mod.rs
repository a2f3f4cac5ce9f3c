//! Recording adapters that capture collaborator calls to a cassette.

pub mod counter;
pub mod directory;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use counter::RecordingCounterStore;
pub use directory::RecordingDirectory;

/// Records a `Result<T, E>` interaction.
///
/// `Ok(v)` is stored as `{"Ok": v}` and `Err(e)` as `{"Err": e}`; the
/// replaying adapters read the same shape back.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: Serialize,
    I: Serialize,
{
    let input_json = serde_json::to_value(input).expect("recording input serializes");
    let output_json = match result {
        Ok(v) => serde_json::json!({ "Ok": v }),
        Err(e) => serde_json::json!({ "Err": e }),
    };

    let mut guard = recorder.lock().expect("recorder lock poisoned");
    guard.record(port, method, input_json, output_json);
}
