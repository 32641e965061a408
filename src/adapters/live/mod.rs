//! Live adapters that talk to Bugzilla and GitHub over HTTP.

pub mod bugzilla;
pub mod github;

pub use bugzilla::LiveBugTracker;
pub use github::LiveProjectTracker;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TrackerError;

/// Sends a request and returns the body of a successful response.
///
/// `what` names the record being read or written and ends up in
/// [`TrackerError::NotFound`].
pub(crate) async fn send(
    service: &'static str,
    request: RequestBuilder,
    what: &str,
) -> Result<String, TrackerError> {
    let response = request
        .send()
        .await
        .map_err(|e| TrackerError::Transport { service, message: e.to_string() })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TrackerError::Transport { service, message: e.to_string() })?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(status_error(service, status, body, what))
    }
}

/// Sends a request and decodes the JSON body of a successful response.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
    what: &str,
) -> Result<T, TrackerError> {
    let body = send(service, request, what).await?;
    decode(service, &body)
}

pub(crate) fn decode<T: DeserializeOwned>(service: &'static str, body: &str) -> Result<T, TrackerError> {
    serde_json::from_str(body).map_err(|e| TrackerError::Decode { service, message: e.to_string() })
}

/// Maps a non-success response to the matching error.
///
/// GitHub signals an exhausted rate limit with 403 and a message rather than
/// always using 429.
pub(crate) fn status_error(service: &'static str, status: StatusCode, body: String, what: &str) -> TrackerError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && body.to_lowercase().contains("rate limit"))
    {
        return TrackerError::RateLimited { service };
    }
    if status == StatusCode::NOT_FOUND {
        return TrackerError::NotFound(what.to_string());
    }
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    TrackerError::Status { service, status: status.as_u16(), message }
}
