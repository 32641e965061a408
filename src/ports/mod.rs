//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the reconciliation core and an
//! external tracker. Implementations live in `src/adapters/`.

pub mod bug_tracker;
pub mod project_tracker;

use std::future::Future;
use std::pin::Pin;

use crate::error::TrackerError;

pub use bug_tracker::BugTracker;
pub use project_tracker::ProjectTracker;

/// Boxed future type alias used by the port traits to keep them dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TrackerError>> + Send + 'a>>;
