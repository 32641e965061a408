//! Replaying adapter for the `ProjectTracker` port.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::GITHUB_PORT;
use crate::error::TrackerError;
use crate::model::{Card, ColumnRef, LabelInfo, NewIssue, ProjectBoard, TargetIssue};
use crate::ports::{PortFuture, ProjectTracker};

/// Serves recorded project tracker results from a cassette.
pub struct ReplayingProjectTracker {
    replayer: Option<Arc<Mutex<CassetteReplayer>>>,
}

impl ReplayingProjectTracker {
    /// Create a replaying project tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Create a replaying project tracker with no cassette. Every call fails.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }

    fn replay<T: DeserializeOwned + Send + 'static>(&self, method: &str) -> PortFuture<'_, T> {
        let result = next_output(self.replayer.as_ref(), GITHUB_PORT, method).and_then(replay_result);
        Box::pin(async move { result })
    }
}

impl ProjectTracker for ReplayingProjectTracker {
    fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>> {
        self.replay("list_labels")
    }

    fn list_issues_by_label(&self, _label: &str) -> PortFuture<'_, Vec<TargetIssue>> {
        self.replay("list_issues_by_label")
    }

    fn create_issue(&self, _issue: &NewIssue) -> PortFuture<'_, TargetIssue> {
        self.replay("create_issue")
    }

    fn update_content(&self, _number: u64, _title: &str, _body: &str) -> PortFuture<'_, ()> {
        self.replay("update_content")
    }

    fn update_labels(&self, _number: u64, _labels: &BTreeSet<String>) -> PortFuture<'_, ()> {
        self.replay("update_labels")
    }

    fn set_open_state(&self, _number: u64, _open: bool) -> PortFuture<'_, ()> {
        self.replay("set_open_state")
    }

    fn set_assignee(&self, _number: u64, _login: &str) -> PortFuture<'_, ()> {
        self.replay("set_assignee")
    }

    fn add_comment(&self, _number: u64, _body: &str) -> PortFuture<'_, ()> {
        self.replay("add_comment")
    }

    fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>> {
        self.replay("list_project_boards")
    }

    fn get_project_column(&self, _card_id: u64) -> PortFuture<'_, ColumnRef> {
        self.replay("get_project_column")
    }

    fn move_card(&self, _card_id: u64, _column_id: u64) -> PortFuture<'_, ()> {
        self.replay("move_card")
    }

    fn create_card(&self, _column_id: u64, _issue_id: u64) -> PortFuture<'_, Card> {
        self.replay("create_card")
    }
}
