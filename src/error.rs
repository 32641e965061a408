//! Error types for tracker ports and whole sync runs.
//!
//! [`TrackerError`] is what a single port call fails with. [`SyncError`] is
//! what aborts a run: anything that happens before the intent list is
//! computed, plus configuration and startup problems.

use std::path::PathBuf;

use thiserror::Error;

/// A failed call against the bug tracker or the project tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request never produced an HTTP response.
    #[error("request to {service} failed: {message}")]
    Transport {
        /// Which tracker was called (`"bugzilla"` or `"github"`).
        service: &'static str,
        /// Underlying transport error text.
        message: String,
    },

    /// The tracker answered with a non-success status.
    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        /// Which tracker was called.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body or error message reported by the tracker.
        message: String,
    },

    /// The tracker refused the request because of rate limiting.
    #[error("{service} rate limit exceeded")]
    RateLimited {
        /// Which tracker was called.
        service: &'static str,
    },

    /// The requested record does not exist or is not visible to us.
    #[error("{0} not found")]
    NotFound(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode {service} response: {message}")]
    Decode {
        /// Which tracker was called.
        service: &'static str,
        /// Deserialization error text.
        message: String,
    },

    /// An error captured in a cassette and served during replay.
    #[error("{0}")]
    Replayed(String),
}

impl TrackerError {
    /// Returns `true` when the record is missing or inaccessible, as opposed
    /// to the tracker itself being unreachable.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::config::SyncConfig`].
    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required secret is missing from the environment.
    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),

    /// A tracker could not be read while taking the run's snapshot.
    #[error("{tracker} unavailable: {source}")]
    Unavailable {
        /// Which tracker failed.
        tracker: &'static str,
        /// The failing call.
        #[source]
        source: TrackerError,
    },

    /// A cassette could not be loaded or written.
    #[error("Cassette error: {0}")]
    Cassette(String),

    /// The async runtime could not be started.
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Command-line arguments were rejected.
    #[error("{0}")]
    Usage(String),
}

impl SyncError {
    /// Wraps a bug tracker read failure.
    #[must_use]
    pub fn bugzilla(source: TrackerError) -> Self {
        Self::Unavailable { tracker: "Bugzilla", source }
    }

    /// Wraps a project tracker read failure.
    #[must_use]
    pub fn github(source: TrackerError) -> Self {
        Self::Unavailable { tracker: "GitHub", source }
    }
}
