//! Cassette format for recording and replaying tracker interactions.
//!
//! A recorded run leaves one cassette per tracker in a timestamped
//! directory. Replaying that directory reproduces the run offline.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

/// Port name of the bug tracker in cassettes.
pub const BUGZILLA_PORT: &str = "bugzilla";

/// Port name of the project tracker in cassettes.
pub const GITHUB_PORT: &str = "github";
