//! Replaying adapters that serve recorded interactions.

pub mod bugzilla;
pub mod github;

pub use bugzilla::ReplayingBugTracker;
pub use github::ReplayingProjectTracker;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::TrackerError;

/// Take the next recorded output for a port method.
///
/// Mirror of `recording::record_result` - reads instead of writing.
pub(crate) fn next_output(
    replayer: Option<&Arc<Mutex<CassetteReplayer>>>,
    port: &str,
    method: &str,
) -> Result<Value, TrackerError> {
    let replayer = replayer
        .ok_or_else(|| TrackerError::Replayed(format!("no cassette configured for port {port:?}")))?;
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).map(|i| i.output.clone()).map_err(TrackerError::Replayed)
}

/// Decode a recorded `{"Ok": v}` / `{"Err": msg}` output.
pub(crate) fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, TrackerError> {
    if let Some(what) = output.get("not_found").and_then(Value::as_str) {
        return Err(TrackerError::NotFound(what.to_string()));
    }
    if let Some(err) = output.get("Err") {
        let message = err.as_str().map_or_else(|| err.to_string(), str::to_string);
        return Err(TrackerError::Replayed(message));
    }
    let Some(ok) = output.get("Ok") else {
        return Err(TrackerError::Replayed(format!("cassette output is neither Ok nor Err: {output}")));
    };
    serde_json::from_value(ok.clone())
        .map_err(|e| TrackerError::Replayed(format!("cassette output does not decode: {e}")))
}
