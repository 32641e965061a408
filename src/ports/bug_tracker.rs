//! Bug tracker port.

use super::PortFuture;
use crate::model::{BugId, SourceIssue};

/// Read-only access to the bug tracker.
///
/// Abstracting the tracker allows deterministic replay and testing
/// without touching a real Bugzilla instance.
pub trait BugTracker: Send + Sync {
    /// Lists open bugs carrying the given whiteboard tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn query_by_whiteboard_tag(&self, tag: &str) -> PortFuture<'_, Vec<SourceIssue>>;

    /// Fetches one bug.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TrackerError::NotFound`] if the bug does not
    /// exist or is not visible, or another error if the request fails.
    fn get_bug(&self, id: BugId) -> PortFuture<'_, SourceIssue>;

    /// Fetches several bugs in one request. Bugs that do not exist or are
    /// not visible are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_bugs(&self, ids: &[BugId]) -> PortFuture<'_, Vec<SourceIssue>>;

    /// Lists the bugs `id` depends on.
    ///
    /// # Errors
    ///
    /// Returns an error if the bug cannot be read.
    fn get_dependencies(&self, id: BugId) -> PortFuture<'_, Vec<BugId>>;
}
