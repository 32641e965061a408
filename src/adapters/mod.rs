//! Adapter implementations of the tracker ports.
//!
//! - `live`: real HTTP calls against Bugzilla and GitHub
//! - `recording`: wraps another adapter and captures every call to a cassette
//! - `replaying`: serves recorded results from a cassette without network access

pub mod live;
pub mod recording;
pub mod replaying;
