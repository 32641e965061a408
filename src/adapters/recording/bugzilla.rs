//! Recording adapter for the `BugTracker` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::BUGZILLA_PORT;
use crate::model::{BugId, SourceIssue};
use crate::ports::{BugTracker, PortFuture};

/// Records bug tracker interactions while delegating to an inner implementation.
pub struct RecordingBugTracker {
    inner: Box<dyn BugTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingBugTracker {
    /// Creates a new recording bug tracker wrapping the given implementation.
    pub fn new(inner: Box<dyn BugTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl BugTracker for RecordingBugTracker {
    fn query_by_whiteboard_tag(&self, tag: &str) -> PortFuture<'_, Vec<SourceIssue>> {
        let tag = tag.to_string();
        Box::pin(async move {
            let result = self.inner.query_by_whiteboard_tag(&tag).await;
            record_result(&self.recorder, BUGZILLA_PORT, "query_by_whiteboard_tag", &tag, &result);
            result
        })
    }

    fn get_bug(&self, id: BugId) -> PortFuture<'_, SourceIssue> {
        Box::pin(async move {
            let result = self.inner.get_bug(id).await;
            record_result(&self.recorder, BUGZILLA_PORT, "get_bug", &id, &result);
            result
        })
    }

    fn get_bugs(&self, ids: &[BugId]) -> PortFuture<'_, Vec<SourceIssue>> {
        let ids = ids.to_vec();
        Box::pin(async move {
            let result = self.inner.get_bugs(&ids).await;
            record_result(&self.recorder, BUGZILLA_PORT, "get_bugs", &ids, &result);
            result
        })
    }

    fn get_dependencies(&self, id: BugId) -> PortFuture<'_, Vec<BugId>> {
        Box::pin(async move {
            let result = self.inner.get_dependencies(id).await;
            record_result(&self.recorder, BUGZILLA_PORT, "get_dependencies", &id, &result);
            result
        })
    }
}
