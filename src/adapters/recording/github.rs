//! Recording adapter for the `ProjectTracker` port.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::GITHUB_PORT;
use crate::model::{Card, ColumnRef, LabelInfo, NewIssue, ProjectBoard, TargetIssue};
use crate::ports::{PortFuture, ProjectTracker};

/// Records project tracker interactions while delegating to an inner implementation.
pub struct RecordingProjectTracker {
    inner: Box<dyn ProjectTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProjectTracker {
    /// Creates a new recording project tracker wrapping the given implementation.
    pub fn new(inner: Box<dyn ProjectTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct ContentInput {
    number: u64,
    title: String,
    body: String,
}

#[derive(Serialize)]
struct LabelsInput {
    number: u64,
    labels: BTreeSet<String>,
}

#[derive(Serialize)]
struct OpenStateInput {
    number: u64,
    open: bool,
}

#[derive(Serialize)]
struct TextInput {
    number: u64,
    text: String,
}

#[derive(Serialize)]
struct MoveInput {
    card_id: u64,
    column_id: u64,
}

#[derive(Serialize)]
struct CardInput {
    column_id: u64,
    issue_id: u64,
}

impl ProjectTracker for RecordingProjectTracker {
    fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>> {
        Box::pin(async move {
            let result = self.inner.list_labels().await;
            record_result(&self.recorder, GITHUB_PORT, "list_labels", &(), &result);
            result
        })
    }

    fn list_issues_by_label(&self, label: &str) -> PortFuture<'_, Vec<TargetIssue>> {
        let label = label.to_string();
        Box::pin(async move {
            let result = self.inner.list_issues_by_label(&label).await;
            record_result(&self.recorder, GITHUB_PORT, "list_issues_by_label", &label, &result);
            result
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TargetIssue> {
        let issue = issue.clone();
        Box::pin(async move {
            let result = self.inner.create_issue(&issue).await;
            record_result(&self.recorder, GITHUB_PORT, "create_issue", &issue, &result);
            result
        })
    }

    fn update_content(&self, number: u64, title: &str, body: &str) -> PortFuture<'_, ()> {
        let input = ContentInput { number, title: title.to_string(), body: body.to_string() };
        Box::pin(async move {
            let result = self.inner.update_content(number, &input.title, &input.body).await;
            record_result(&self.recorder, GITHUB_PORT, "update_content", &input, &result);
            result
        })
    }

    fn update_labels(&self, number: u64, labels: &BTreeSet<String>) -> PortFuture<'_, ()> {
        let input = LabelsInput { number, labels: labels.clone() };
        Box::pin(async move {
            let result = self.inner.update_labels(number, &input.labels).await;
            record_result(&self.recorder, GITHUB_PORT, "update_labels", &input, &result);
            result
        })
    }

    fn set_open_state(&self, number: u64, open: bool) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let result = self.inner.set_open_state(number, open).await;
            record_result(&self.recorder, GITHUB_PORT, "set_open_state", &OpenStateInput { number, open }, &result);
            result
        })
    }

    fn set_assignee(&self, number: u64, login: &str) -> PortFuture<'_, ()> {
        let input = TextInput { number, text: login.to_string() };
        Box::pin(async move {
            let result = self.inner.set_assignee(number, &input.text).await;
            record_result(&self.recorder, GITHUB_PORT, "set_assignee", &input, &result);
            result
        })
    }

    fn add_comment(&self, number: u64, body: &str) -> PortFuture<'_, ()> {
        let input = TextInput { number, text: body.to_string() };
        Box::pin(async move {
            let result = self.inner.add_comment(number, &input.text).await;
            record_result(&self.recorder, GITHUB_PORT, "add_comment", &input, &result);
            result
        })
    }

    fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>> {
        Box::pin(async move {
            let result = self.inner.list_project_boards().await;
            record_result(&self.recorder, GITHUB_PORT, "list_project_boards", &(), &result);
            result
        })
    }

    fn get_project_column(&self, card_id: u64) -> PortFuture<'_, ColumnRef> {
        Box::pin(async move {
            let result = self.inner.get_project_column(card_id).await;
            record_result(&self.recorder, GITHUB_PORT, "get_project_column", &card_id, &result);
            result
        })
    }

    fn move_card(&self, card_id: u64, column_id: u64) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let result = self.inner.move_card(card_id, column_id).await;
            record_result(&self.recorder, GITHUB_PORT, "move_card", &MoveInput { card_id, column_id }, &result);
            result
        })
    }

    fn create_card(&self, column_id: u64, issue_id: u64) -> PortFuture<'_, Card> {
        Box::pin(async move {
            let result = self.inner.create_card(column_id, issue_id).await;
            record_result(&self.recorder, GITHUB_PORT, "create_card", &CardInput { column_id, issue_id }, &result);
            result
        })
    }
}
