//! Replaying adapter for the `BugTracker` port.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::BUGZILLA_PORT;
use crate::model::{BugId, SourceIssue};
use crate::ports::{BugTracker, PortFuture};

/// Serves recorded bug tracker results from a cassette.
pub struct ReplayingBugTracker {
    replayer: Option<Arc<Mutex<CassetteReplayer>>>,
}

impl ReplayingBugTracker {
    /// Create a replaying bug tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Create a replaying bug tracker with no cassette. Every call fails.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }

    fn replay<T: DeserializeOwned + Send + 'static>(&self, method: &str) -> PortFuture<'_, T> {
        let result = next_output(self.replayer.as_ref(), BUGZILLA_PORT, method).and_then(replay_result);
        Box::pin(async move { result })
    }
}

impl BugTracker for ReplayingBugTracker {
    fn query_by_whiteboard_tag(&self, _tag: &str) -> PortFuture<'_, Vec<SourceIssue>> {
        self.replay("query_by_whiteboard_tag")
    }

    fn get_bug(&self, _id: BugId) -> PortFuture<'_, SourceIssue> {
        self.replay("get_bug")
    }

    fn get_bugs(&self, _ids: &[BugId]) -> PortFuture<'_, Vec<SourceIssue>> {
        self.replay("get_bugs")
    }

    fn get_dependencies(&self, _id: BugId) -> PortFuture<'_, Vec<BugId>> {
        self.replay("get_dependencies")
    }
}
