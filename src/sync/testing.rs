//! In-memory trackers and builders shared by the sync tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::error::TrackerError;
use crate::model::{
    marker, BoardColumn, BugId, Card, ColumnRef, LabelInfo, NewIssue, ProjectBoard, SourceIssue,
    TargetIssue,
};
use crate::ports::{BugTracker, PortFuture, ProjectTracker};

pub const BZ_URL: &str = "https://bugzilla.mozilla.org";

pub fn issue_url(number: u64) -> String {
    format!("https://api.github.com/repos/mozilla/gfx/issues/{number}")
}

/// Builder for [`SourceIssue`] fixtures. Bugs start open, unassigned and
/// titled `Bug {id}`.
pub struct BugBuilder(SourceIssue);

pub fn bug(id: u64) -> BugBuilder {
    BugBuilder(SourceIssue {
        id: BugId(id),
        summary: Some(format!("Bug {id}")),
        description: Some(format!("Description of bug {id}")),
        is_open: true,
        status: "NEW".into(),
        resolution: None,
        assignee: None,
        whiteboard_tags: BTreeSet::new(),
        dependency_ids: BTreeSet::new(),
        see_also: Vec::new(),
    })
}

impl BugBuilder {
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.0.whiteboard_tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    pub fn depends_on(mut self, ids: &[u64]) -> Self {
        self.0.dependency_ids = ids.iter().map(|id| BugId(*id)).collect();
        self
    }

    pub fn resolved(mut self, resolution: &str) -> Self {
        self.0.is_open = false;
        self.0.status = "RESOLVED".into();
        self.0.resolution = Some(resolution.into());
        self
    }

    pub fn assigned(mut self, email: &str) -> Self {
        self.0.status = "ASSIGNED".into();
        self.0.assignee = Some(email.into());
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.0.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.0.description = Some(description.into());
        self
    }

    pub fn see_also(mut self, url: &str) -> Self {
        self.0.see_also.push(url.into());
        self
    }

    pub fn build(self) -> SourceIssue {
        self.0
    }
}

/// A mirror issue already in sync with `source`, carrying `labels`.
pub fn mirror_of(source: &SourceIssue, number: u64, labels: &[&str]) -> TargetIssue {
    let body = marker::compose_body(source.mirror_description(), source.id, BZ_URL, None);
    TargetIssue {
        id: number + 9000,
        number,
        title: source.mirror_title().to_string(),
        body,
        labels: labels.iter().map(|l| (*l).to_string()).collect(),
        is_open: source.is_open,
        assignee: None,
        api_url: issue_url(number),
        source_id: Some(source.id),
    }
}

pub fn label(name: &str, description: Option<&str>) -> LabelInfo {
    LabelInfo { name: name.into(), description: description.map(String::from) }
}

/// Board with one column per name; ids are `base + index`.
pub fn board(id: u64, name: &str, columns: &[&str]) -> ProjectBoard {
    ProjectBoard {
        id,
        name: name.into(),
        columns: columns
            .iter()
            .zip(0u64..)
            .map(|(column, i)| BoardColumn { id: id * 100 + i, name: (*column).into(), cards: Vec::new() })
            .collect(),
    }
}

/// Bug tracker backed by a fixed set of bugs. Bugs missing from the set
/// answer `NotFound`.
pub struct FakeBugTracker {
    bugs: BTreeMap<BugId, SourceIssue>,
    calls: Mutex<Vec<String>>,
    failing: bool,
}

impl FakeBugTracker {
    pub fn new(bugs: Vec<SourceIssue>) -> Self {
        Self {
            bugs: bugs.into_iter().map(|b| (b.id, b)).collect(),
            calls: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    /// Every call fails as if Bugzilla were down.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: String) -> Result<(), TrackerError> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            return Err(TrackerError::Status { service: "bugzilla", status: 503, message: "down".into() });
        }
        Ok(())
    }

    fn lookup(&self, id: BugId) -> Result<SourceIssue, TrackerError> {
        self.bugs.get(&id).cloned().ok_or_else(|| TrackerError::NotFound(format!("bug {id}")))
    }
}

impl BugTracker for FakeBugTracker {
    fn query_by_whiteboard_tag(&self, tag: &str) -> PortFuture<'_, Vec<SourceIssue>> {
        let tag = tag.to_string();
        Box::pin(async move {
            self.record(format!("query {tag}"))?;
            Ok(self
                .bugs
                .values()
                .filter(|b| b.is_open && b.whiteboard_tags.contains(&tag))
                .cloned()
                .collect())
        })
    }

    fn get_bug(&self, id: BugId) -> PortFuture<'_, SourceIssue> {
        Box::pin(async move {
            self.record(format!("get_bug {id}"))?;
            self.lookup(id)
        })
    }

    fn get_bugs(&self, ids: &[BugId]) -> PortFuture<'_, Vec<SourceIssue>> {
        let ids = ids.to_vec();
        Box::pin(async move {
            let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
            self.record(format!("get_bugs {}", list.join(",")))?;
            Ok(ids.into_iter().filter_map(|id| self.bugs.get(&id).cloned()).collect())
        })
    }

    fn get_dependencies(&self, id: BugId) -> PortFuture<'_, Vec<BugId>> {
        Box::pin(async move {
            self.record(format!("get_dependencies {id}"))?;
            Ok(self.lookup(id)?.dependency_ids.into_iter().collect())
        })
    }
}

#[derive(Default)]
struct ProjectState {
    labels: Vec<LabelInfo>,
    issues: Vec<TargetIssue>,
    boards: Vec<ProjectBoard>,
    comments: Vec<(u64, String)>,
    next_card: u64,
    fail: BTreeSet<String>,
    writes: Vec<String>,
}

/// Stateful in-memory project tracker. Writes are applied, so a second
/// reconciliation sees the result of the first.
pub struct FakeProjectTracker {
    state: Mutex<ProjectState>,
}

impl FakeProjectTracker {
    pub fn new(labels: Vec<LabelInfo>, issues: Vec<TargetIssue>, boards: Vec<ProjectBoard>) -> Self {
        Self {
            state: Mutex::new(ProjectState { labels, issues, boards, next_card: 5000, ..ProjectState::default() }),
        }
    }

    /// Makes every call of the named write method fail.
    pub fn fail_on(&self, method: &str) {
        self.state.lock().unwrap().fail.insert(method.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().fail.clear();
    }

    pub fn issues(&self) -> Vec<TargetIssue> {
        self.state.lock().unwrap().issues.clone()
    }

    pub fn issue(&self, number: u64) -> TargetIssue {
        self.issues().into_iter().find(|i| i.number == number).expect("issue exists")
    }

    pub fn boards(&self) -> Vec<ProjectBoard> {
        self.state.lock().unwrap().boards.clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().comments.clone()
    }

    /// Names of successful write calls, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Moves a card behind the reconciler's back.
    pub fn move_card_externally(&self, card_id: u64, column_id: u64) {
        let mut state = self.state.lock().unwrap();
        relocate(&mut state.boards, card_id, column_id);
    }

    fn write<T>(
        &self,
        method: &str,
        apply: impl FnOnce(&mut ProjectState) -> Result<T, TrackerError>,
    ) -> Result<T, TrackerError> {
        let mut state = self.state.lock().unwrap();
        if state.fail.contains(method) {
            return Err(TrackerError::Status { service: "github", status: 500, message: "boom".into() });
        }
        let value = apply(&mut state)?;
        state.writes.push(method.to_string());
        Ok(value)
    }
}

fn relocate(boards: &mut [ProjectBoard], card_id: u64, column_id: u64) -> bool {
    for board in boards.iter_mut() {
        let Some(card) = board.columns.iter_mut().find_map(|c| {
            c.cards.iter().position(|card| card.id == card_id).map(|pos| c.cards.remove(pos))
        }) else {
            continue;
        };
        if let Some(column) = board.columns.iter_mut().find(|c| c.id == column_id) {
            column.cards.push(card);
            return true;
        }
    }
    false
}

fn find_issue(state: &mut ProjectState, number: u64) -> Result<&mut TargetIssue, TrackerError> {
    state
        .issues
        .iter_mut()
        .find(|i| i.number == number)
        .ok_or_else(|| TrackerError::NotFound(format!("issue #{number}")))
}

impl ProjectTracker for FakeProjectTracker {
    fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>> {
        Box::pin(async move { Ok(self.state.lock().unwrap().labels.clone()) })
    }

    fn list_issues_by_label(&self, label: &str) -> PortFuture<'_, Vec<TargetIssue>> {
        let label = label.to_string();
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            Ok(state.issues.iter().filter(|i| i.labels.contains(&label)).cloned().collect())
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TargetIssue> {
        let issue = issue.clone();
        Box::pin(async move {
            self.write("create_issue", |state| {
                let number = state.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
                let created = TargetIssue {
                    id: number + 9000,
                    number,
                    source_id: marker::parse(&issue.body),
                    title: issue.title,
                    body: issue.body,
                    labels: issue.labels,
                    is_open: true,
                    assignee: issue.assignee,
                    api_url: issue_url(number),
                };
                state.issues.push(created.clone());
                Ok(created)
            })
        })
    }

    fn update_content(&self, number: u64, title: &str, body: &str) -> PortFuture<'_, ()> {
        let (title, body) = (title.to_string(), body.to_string());
        Box::pin(async move {
            self.write("update_content", |state| {
                let issue = find_issue(state, number)?;
                issue.source_id = marker::parse(&body);
                issue.title = title;
                issue.body = body;
                Ok(())
            })
        })
    }

    fn update_labels(&self, number: u64, labels: &BTreeSet<String>) -> PortFuture<'_, ()> {
        let labels = labels.clone();
        Box::pin(async move {
            self.write("update_labels", |state| {
                find_issue(state, number)?.labels = labels;
                Ok(())
            })
        })
    }

    fn set_open_state(&self, number: u64, open: bool) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.write("set_open_state", |state| {
                find_issue(state, number)?.is_open = open;
                Ok(())
            })
        })
    }

    fn set_assignee(&self, number: u64, login: &str) -> PortFuture<'_, ()> {
        let login = login.to_string();
        Box::pin(async move {
            self.write("set_assignee", |state| {
                find_issue(state, number)?.assignee = Some(login);
                Ok(())
            })
        })
    }

    fn add_comment(&self, number: u64, body: &str) -> PortFuture<'_, ()> {
        let body = body.to_string();
        Box::pin(async move {
            self.write("add_comment", |state| {
                find_issue(state, number)?;
                state.comments.push((number, body));
                Ok(())
            })
        })
    }

    fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>> {
        Box::pin(async move { Ok(self.state.lock().unwrap().boards.clone()) })
    }

    fn get_project_column(&self, card_id: u64) -> PortFuture<'_, ColumnRef> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            state
                .boards
                .iter()
                .flat_map(|b| &b.columns)
                .find(|c| c.cards.iter().any(|card| card.id == card_id))
                .map(BoardColumn::column_ref)
                .ok_or_else(|| TrackerError::NotFound(format!("card {card_id}")))
        })
    }

    fn move_card(&self, card_id: u64, column_id: u64) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.write("move_card", |state| {
                if relocate(&mut state.boards, card_id, column_id) {
                    Ok(())
                } else {
                    Err(TrackerError::NotFound(format!("card {card_id}")))
                }
            })
        })
    }

    fn create_card(&self, column_id: u64, issue_id: u64) -> PortFuture<'_, Card> {
        Box::pin(async move {
            self.write("create_card", |state| {
                let url = state
                    .issues
                    .iter()
                    .find(|i| i.id == issue_id)
                    .map(|i| i.api_url.clone())
                    .ok_or_else(|| TrackerError::NotFound(format!("issue id {issue_id}")))?;
                state.next_card += 1;
                let card = Card { id: state.next_card, content_url: Some(url) };
                let column = state
                    .boards
                    .iter_mut()
                    .flat_map(|b| b.columns.iter_mut())
                    .find(|c| c.id == column_id)
                    .ok_or_else(|| TrackerError::NotFound(format!("column {column_id}")))?;
                column.cards.push(card.clone());
                Ok(card)
            })
        })
    }
}
