//! The diff engine: compare the bug snapshot with the issue snapshot and
//! emit the intents that make GitHub converge.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{SyncConfig, SyncPolicy};
use crate::model::{
    marker, BugId, IssueRef, MutationIntent, NewIssue, ProjectBoard, SourceIssue, TargetIssue,
};

use super::board::{plan_card_move, Placement};
use super::rules::RuleSet;
use super::sources::Scope;

/// Settings the diff engine needs from the run configuration.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Label carried by every mirror issue.
    pub mirror_label: String,
    /// Bugzilla base URL used in the body marker.
    pub bugzilla_url: String,
    /// Target repository, `owner/name`.
    pub repo: String,
    /// Prefix marking rule labels.
    pub label_prefix: String,
    /// Policy switches.
    pub policy: SyncPolicy,
    /// Bugzilla email to GitHub login.
    pub identities: BTreeMap<String, String>,
}

impl ReconcileSettings {
    /// Extracts the settings from a loaded config.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            mirror_label: config.github.mirror_label.clone(),
            bugzilla_url: config.bugzilla.url.clone(),
            repo: config.github.repo.clone(),
            label_prefix: config.github.label_prefix.clone(),
            policy: config.policy,
            identities: config.identity_map(),
        }
    }

    fn links_to_repo(&self, url: &str) -> bool {
        let needle = format!("github.com/{}/issues/", self.repo).to_lowercase();
        url.to_lowercase().contains(&needle)
    }
}

/// Mirror issues keyed by the bug they point at.
#[derive(Debug, Default)]
pub struct MirrorIndex<'a> {
    by_bug: BTreeMap<BugId, &'a TargetIssue>,
}

impl<'a> MirrorIndex<'a> {
    /// Indexes issues by their marker.
    ///
    /// When several issues mirror the same bug an open one is preferred,
    /// then the lowest-numbered one. Issues without a marker are ignored.
    #[must_use]
    pub fn build(issues: &'a [TargetIssue]) -> Self {
        let mut sorted: Vec<&TargetIssue> = issues.iter().collect();
        sorted.sort_by_key(|i| (!i.is_open, i.number));

        let mut by_bug = BTreeMap::new();
        for issue in sorted {
            let Some(bug) = issue.source_id else {
                tracing::warn!(issue = issue.number, "mirror-labelled issue has no Bugzilla marker; ignored");
                continue;
            };
            if let Some(kept) = by_bug.get(&bug).map(|i: &&TargetIssue| i.number) {
                tracing::warn!(bug = %bug, issue = issue.number, kept, "duplicate mirror issue ignored");
                continue;
            }
            by_bug.insert(bug, issue);
        }
        Self { by_bug }
    }

    /// The mirror of `bug`, if any.
    #[must_use]
    pub fn get(&self, bug: BugId) -> Option<&'a TargetIssue> {
        self.by_bug.get(&bug).copied()
    }

    /// Bugs whose mirror issue is open.
    #[must_use]
    pub fn open_sources(&self) -> Vec<BugId> {
        self.by_bug.iter().filter(|(_, i)| i.is_open).map(|(bug, _)| *bug).collect()
    }

    /// Number of indexed mirrors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_bug.len()
    }

    /// Whether no mirror was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_bug.is_empty()
    }
}

struct Engine<'a> {
    scope: &'a Scope,
    rules: &'a RuleSet,
    boards: BTreeMap<String, &'a ProjectBoard>,
    settings: &'a ReconcileSettings,
    intents: Vec<MutationIntent>,
}

/// Computes the intents for every bug in scope, sorted by bug id and then
/// by [`crate::model::IntentKind`].
///
/// Pure: equal inputs give equal output, and applying the output then
/// planning again against fresh snapshots gives an empty list.
#[must_use]
pub fn plan_intents(
    scope: &Scope,
    rules: &RuleSet,
    mirrors: &MirrorIndex<'_>,
    boards: &[ProjectBoard],
    settings: &ReconcileSettings,
) -> Vec<MutationIntent> {
    let boards: BTreeMap<String, &ProjectBoard> =
        boards.iter().map(|b| (b.name.to_lowercase(), b)).collect();
    for project in rules.rules().iter().filter_map(|r| r.project_name.as_deref()) {
        if !boards.contains_key(&project.to_lowercase()) {
            tracing::warn!(project, "project board not found; cards will not be placed");
        }
    }

    let mut engine = Engine { scope, rules, boards, settings, intents: Vec::new() };
    for bug in scope.bugs() {
        match mirrors.get(bug.id) {
            None => engine.create(bug),
            Some(issue) => engine.update(bug, issue),
        }
    }

    let mut intents = engine.intents;
    intents.sort_by_key(|i| (i.bug(), i.kind()));
    intents
}

impl Engine<'_> {
    fn create(&mut self, bug: &SourceIssue) {
        let rule_labels = self.scope.labels_for(bug.id);
        if rule_labels.is_empty() {
            return;
        }
        if !bug.is_open {
            tracing::debug!(bug = %bug.id, "resolved bug has no mirror; not creating one");
            return;
        }
        if let Some(url) = bug.see_also.iter().find(|u| self.settings.links_to_repo(u)) {
            tracing::info!(bug = %bug.id, see_also = %url, "bug links to an existing issue; not creating one");
            return;
        }

        let mut labels = rule_labels.clone();
        labels.insert(self.settings.mirror_label.clone());
        let issue = NewIssue {
            title: bug.mirror_title().to_string(),
            body: marker::compose_body(bug.mirror_description(), bug.id, &self.settings.bugzilla_url, None),
            labels,
            assignee: self.login_for(bug).map(str::to_string),
        };
        self.intents.push(MutationIntent::CreateIssue { bug: bug.id, issue });

        let placement = Placement {
            bug: bug.id,
            issue: IssueRef::Created(bug.id),
            issue_url: None,
            open_now: true,
            open_after: true,
            assigned: bug.assignee.is_some(),
        };
        self.place_cards(&rule_labels, &placement);
    }

    fn update(&mut self, bug: &SourceIssue, issue: &TargetIssue) {
        let open_after = bug.is_open && (issue.is_open || self.settings.policy.reopen);
        let frozen = !issue.is_open && !open_after;

        let board_labels: BTreeSet<String> = if frozen {
            issue.labels.iter().filter(|l| self.rules.is_managed(l)).cloned().collect()
        } else {
            let rule_labels = self.scope.labels_for(bug.id);
            self.update_content(bug, issue);
            self.update_labels(bug, issue, &rule_labels);
            self.update_assignee(bug, issue);
            rule_labels
        };

        if issue.is_open && !bug.is_open {
            let resolution = bug.resolution.as_deref().unwrap_or(&bug.status);
            self.intents.push(MutationIntent::SetOpenState {
                bug: bug.id,
                issue: issue.number,
                open: false,
                comment: Some(format!(
                    "Upstream bug has been closed with the following resolution: {resolution}."
                )),
            });
        } else if !issue.is_open && bug.is_open {
            if self.settings.policy.reopen {
                self.intents.push(MutationIntent::SetOpenState {
                    bug: bug.id,
                    issue: issue.number,
                    open: true,
                    comment: None,
                });
            } else {
                tracing::debug!(bug = %bug.id, issue = issue.number, "bug reopened; mirror stays closed");
            }
        }

        let placement = Placement {
            bug: bug.id,
            issue: IssueRef::Existing { number: issue.number, id: issue.id },
            issue_url: Some(&issue.api_url),
            open_now: issue.is_open,
            open_after,
            assigned: bug.assignee.is_some(),
        };
        self.place_cards(&board_labels, &placement);
    }

    fn update_content(&mut self, bug: &SourceIssue, issue: &TargetIssue) {
        let title = bug.mirror_title();
        let body = marker::compose_body(
            bug.mirror_description(),
            bug.id,
            &self.settings.bugzilla_url,
            Some(&issue.body),
        );
        if issue.title != title || issue.body != body {
            self.intents.push(MutationIntent::UpdateContent {
                bug: bug.id,
                issue: issue.number,
                title: title.to_string(),
                body,
            });
        }
    }

    fn update_labels(&mut self, bug: &SourceIssue, issue: &TargetIssue, rule_labels: &BTreeSet<String>) {
        let mut desired: BTreeSet<String> =
            issue.labels.iter().filter(|l| !self.rules.is_managed(l)).cloned().collect();
        desired.insert(self.settings.mirror_label.clone());
        desired.extend(rule_labels.iter().cloned());

        let added: BTreeSet<String> = desired.difference(&issue.labels).cloned().collect();
        let removed: BTreeSet<String> = issue.labels.difference(&desired).cloned().collect();
        if added.is_empty() && removed.is_empty() {
            return;
        }
        self.intents.push(MutationIntent::UpdateLabels {
            bug: bug.id,
            issue: issue.number,
            labels: desired,
            added,
            removed,
        });
    }

    fn update_assignee(&mut self, bug: &SourceIssue, issue: &TargetIssue) {
        if !bug.is_open {
            return;
        }
        let Some(login) = self.login_for(bug).map(str::to_string) else {
            return;
        };
        if issue.assignee.as_deref() != Some(login.as_str()) {
            self.intents.push(MutationIntent::SetAssignee {
                bug: bug.id,
                issue: issue.number,
                assignee: login,
            });
        }
    }

    fn login_for(&self, bug: &SourceIssue) -> Option<&str> {
        let email = bug.assignee.as_deref()?;
        let login = self.settings.identities.get(email).map(String::as_str);
        if login.is_none() {
            tracing::debug!(bug = %bug.id, assignee = email, "assignee has no GitHub identity");
        }
        login
    }

    fn place_cards(&mut self, labels: &BTreeSet<String>, placement: &Placement<'_>) {
        let projects: BTreeSet<String> = labels
            .iter()
            .filter_map(|l| self.rules.rule_for_label(l))
            .filter_map(|r| r.project_name.as_deref())
            .map(str::to_lowercase)
            .collect();
        for project in projects {
            let Some(board) = self.boards.get(&project) else {
                continue;
            };
            if let Some(intent) = plan_card_move(board, placement, self.settings.policy) {
                self.intents.push(intent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Card, IntentKind, LabelInfo};
    use crate::sync::rules::resolve_rules;
    use crate::sync::sources::{add_tracked_bugs, resolve_sources};
    use crate::sync::testing::{board, bug, issue_url, label, mirror_of, FakeBugTracker, BZ_URL};

    fn settings(policy: SyncPolicy) -> ReconcileSettings {
        ReconcileSettings {
            mirror_label: "bugzilla".into(),
            bugzilla_url: BZ_URL.into(),
            repo: "mozilla/gfx".into(),
            label_prefix: "BZ_".into(),
            policy,
            identities: [("dev@mozilla.com".to_string(), "devgh".to_string())].into(),
        }
    }

    async fn reconcile_with(
        bugs: Vec<SourceIssue>,
        labels: &[LabelInfo],
        issues: &[TargetIssue],
        boards: &[ProjectBoard],
        policy: SyncPolicy,
    ) -> Vec<MutationIntent> {
        let rules = resolve_rules(labels, "BZ_");
        let tracker = FakeBugTracker::new(bugs);
        let mirrors = MirrorIndex::build(issues);
        let mut scope = resolve_sources(&tracker, &rules).await.unwrap();
        add_tracked_bugs(&tracker, &rules, &mut scope, &mirrors.open_sources()).await.unwrap();
        plan_intents(&scope, &rules, &mirrors, boards, &settings(policy))
    }

    async fn reconcile(
        bugs: Vec<SourceIssue>,
        labels: &[LabelInfo],
        issues: &[TargetIssue],
    ) -> Vec<MutationIntent> {
        reconcile_with(bugs, labels, issues, &[], SyncPolicy::default()).await
    }

    fn graphics_board(card_column: &str, issue: u64) -> ProjectBoard {
        let mut b = board(3, "Graphics", &["To do", "In progress", "Sprint 3", "Done"]);
        let column = b.columns.iter_mut().find(|c| c.name == card_column).unwrap();
        column.cards.push(Card { id: 77, content_url: Some(issue_url(issue)) });
        b
    }

    #[tokio::test]
    async fn tagged_bug_without_mirror_is_created() {
        let intents = reconcile(
            vec![bug(100).tags(&["wr-android"]).build()],
            &[label("bugzilla", None), label("BZ_wr-android", None)],
            &[],
        )
        .await;

        assert_eq!(intents.len(), 1);
        let MutationIntent::CreateIssue { bug, issue } = &intents[0] else {
            panic!("expected CreateIssue, got {:?}", intents[0]);
        };
        assert_eq!(*bug, BugId(100));
        assert!(issue.labels.contains("BZ_wr-android"));
        assert!(issue.labels.contains("bugzilla"));
        assert_eq!(marker::parse(&issue.body), Some(BugId(100)));
    }

    #[tokio::test]
    async fn create_carries_union_of_rule_labels() {
        let intents = reconcile(
            vec![bug(1).depends_on(&[2]).build(), bug(2).tags(&["gfx"]).build()],
            &[label("BZ_gfx", None), label("BZ_1", None)],
            &[],
        )
        .await;

        let creates: Vec<&MutationIntent> =
            intents.iter().filter(|i| i.bug() == BugId(2) && i.kind() == IntentKind::CreateIssue).collect();
        assert_eq!(creates.len(), 1);
        let MutationIntent::CreateIssue { issue, .. } = creates[0] else { unreachable!() };
        let labels: Vec<&str> = issue.labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["BZ_1", "BZ_gfx", "bugzilla"]);
    }

    #[tokio::test]
    async fn create_assigns_mapped_identity_and_places_card() {
        let intents = reconcile_with(
            vec![bug(100).tags(&["gfx"]).assigned("dev@mozilla.com").build()],
            &[label("BZ_gfx", Some("[project=graphics]"))],
            &[],
            &[board(3, "Graphics", &["To do", "In progress", "Done"])],
            SyncPolicy::default(),
        )
        .await;

        assert_eq!(intents.len(), 2);
        let MutationIntent::CreateIssue { issue, .. } = &intents[0] else { panic!() };
        assert_eq!(issue.assignee.as_deref(), Some("devgh"));
        let MutationIntent::MoveCard { issue, card, column, .. } = &intents[1] else { panic!() };
        assert_eq!(*issue, IssueRef::Created(BugId(100)));
        assert_eq!(*card, None);
        assert_eq!(column.name, "In progress");
    }

    #[tokio::test]
    async fn resolved_bug_closes_mirror_and_moves_card_to_done() {
        let source = bug(100).tags(&["wr-android"]).resolved("FIXED").build();
        let mut mirror = mirror_of(&source, 7, &["bugzilla", "BZ_wr-android"]);
        mirror.is_open = true;

        let intents = reconcile_with(
            vec![source],
            &[label("BZ_wr-android", Some("[project=Graphics]"))],
            &[mirror],
            &[graphics_board("In progress", 7)],
            SyncPolicy::default(),
        )
        .await;

        assert_eq!(intents.len(), 2, "{intents:?}");
        let MutationIntent::SetOpenState { open, comment, .. } = &intents[0] else { panic!() };
        assert!(!open);
        assert_eq!(
            comment.as_deref(),
            Some("Upstream bug has been closed with the following resolution: FIXED.")
        );
        let MutationIntent::MoveCard { card, column, .. } = &intents[1] else { panic!() };
        assert_eq!(*card, Some(77));
        assert_eq!(column.name, "Done");
    }

    #[tokio::test]
    async fn newly_assigned_bug_in_sprint_column_keeps_its_card() {
        let source = bug(100).tags(&["wr-android"]).assigned("dev@mozilla.com").build();
        let mirror = mirror_of(&source, 7, &["bugzilla", "BZ_wr-android"]);

        let intents = reconcile_with(
            vec![source],
            &[label("BZ_wr-android", Some("[project=Graphics]"))],
            &[mirror],
            &[graphics_board("Sprint 3", 7)],
            SyncPolicy::default(),
        )
        .await;

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].kind(), IntentKind::SetAssignee);
        assert!(!intents.iter().any(|i| i.kind() == IntentKind::MoveCard));
    }

    #[tokio::test]
    async fn foreign_labels_are_never_removed() {
        let source = bug(5).tags(&["gfx"]).build();
        let mirror = mirror_of(&source, 3, &["bugzilla", "P1", "BZ_old", "BZ_two words"]);

        let intents = reconcile(
            vec![source],
            &[label("BZ_gfx", None), label("BZ_two words", None), label("P1", None)],
            &[mirror],
        )
        .await;

        assert_eq!(intents.len(), 1);
        let MutationIntent::UpdateLabels { labels, added, removed, .. } = &intents[0] else { panic!() };
        assert_eq!(added.iter().collect::<Vec<_>>(), vec!["BZ_gfx"]);
        assert_eq!(removed.iter().collect::<Vec<_>>(), vec!["BZ_old"]);
        for foreign in ["P1", "BZ_two words", "bugzilla"] {
            assert!(labels.contains(foreign));
            assert!(!removed.contains(foreign));
        }
    }

    #[tokio::test]
    async fn bug_leaving_every_rule_loses_its_label_but_keeps_its_issue() {
        let source = bug(200).build();
        let mirror = mirror_of(&source, 8, &["bugzilla", "BZ_gfx"]);

        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[mirror]).await;

        assert_eq!(intents.len(), 1);
        let MutationIntent::UpdateLabels { removed, .. } = &intents[0] else { panic!() };
        assert!(removed.contains("BZ_gfx"));
    }

    #[tokio::test]
    async fn in_sync_mirror_needs_nothing() {
        let source = bug(100).tags(&["gfx"]).summary("Crash in compositor").build();
        let mirror = mirror_of(&source, 7, &["bugzilla", "BZ_gfx"]);
        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[mirror]).await;
        assert!(intents.is_empty(), "{intents:?}");
    }

    #[tokio::test]
    async fn changed_summary_updates_content_and_keeps_preserved_lines() {
        let source = bug(100).tags(&["gfx"]).summary("New title").build();
        let mut mirror = mirror_of(&source, 7, &["bugzilla", "BZ_gfx"]);
        mirror.title = "Old title".into();
        mirror.body.push_str("\u{2506}Issue is synchronized with this Jira Task\n");

        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[mirror]).await;

        assert_eq!(intents.len(), 1);
        let MutationIntent::UpdateContent { title, body, .. } = &intents[0] else { panic!() };
        assert_eq!(title, "New title");
        assert!(body.contains("\u{2506}Issue is synchronized with this Jira Task"));
    }

    #[tokio::test]
    async fn closed_mirror_of_reopened_bug_stays_closed_by_default() {
        let source = bug(100).tags(&["gfx"]).summary("Changed").build();
        let mut mirror = mirror_of(&source, 7, &["bugzilla"]);
        mirror.is_open = false;
        mirror.title = "Stale".into();

        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[mirror]).await;
        assert!(intents.is_empty(), "{intents:?}");
    }

    #[tokio::test]
    async fn closed_mirror_of_reopened_bug_reopens_under_policy() {
        let source = bug(100).tags(&["gfx"]).build();
        let mut mirror = mirror_of(&source, 7, &["bugzilla", "BZ_gfx"]);
        mirror.is_open = false;

        let policy = SyncPolicy { reopen: true, ..SyncPolicy::default() };
        let intents = reconcile_with(vec![source], &[label("BZ_gfx", None)], &[mirror], &[], policy).await;

        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], MutationIntent::SetOpenState { open: true, comment: None, .. }));
    }

    #[tokio::test]
    async fn see_also_link_to_repo_suppresses_creation() {
        let intents = reconcile(
            vec![bug(100).tags(&["gfx"]).see_also("https://github.com/Mozilla/gfx/issues/12").build()],
            &[label("BZ_gfx", None)],
            &[],
        )
        .await;
        assert!(intents.is_empty());
    }

    #[tokio::test]
    async fn resolved_closure_members_are_not_created() {
        let intents = reconcile(
            vec![bug(1).depends_on(&[2]).build(), bug(2).resolved("FIXED").build()],
            &[label("BZ_1", None)],
            &[],
        )
        .await;
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].bug(), BugId(1));
    }

    #[tokio::test]
    async fn confidential_bug_is_created_with_placeholders() {
        let mut source = bug(100).tags(&["gfx"]).build();
        source.summary = None;
        source.description = None;
        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[]).await;

        let MutationIntent::CreateIssue { issue, .. } = &intents[0] else { panic!() };
        assert_eq!(issue.title, "Confidential Bugzilla issue");
        assert!(issue.body.starts_with("No description is available"));
    }

    #[tokio::test]
    async fn duplicate_mirrors_resolve_to_lowest_number() {
        let source = bug(100).tags(&["gfx"]).build();
        let first = mirror_of(&source, 4, &["bugzilla"]);
        let second = mirror_of(&source, 9, &["bugzilla"]);

        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[second, first]).await;

        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], MutationIntent::UpdateLabels { issue: 4, .. }));
    }

    #[tokio::test]
    async fn open_duplicate_wins_over_older_closed_one() {
        let source = bug(100).tags(&["gfx"]).build();
        let mut closed = mirror_of(&source, 4, &["bugzilla"]);
        closed.is_open = false;
        let open = mirror_of(&source, 9, &["bugzilla"]);

        let intents = reconcile(vec![source], &[label("BZ_gfx", None)], &[closed, open]).await;

        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], MutationIntent::UpdateLabels { issue: 9, .. }));
    }

    #[tokio::test]
    async fn intents_are_ordered_by_bug_then_kind() {
        let resolved = bug(50).tags(&["gfx"]).resolved("WONTFIX").build();
        let mut mirror = mirror_of(&resolved, 2, &["bugzilla"]);
        mirror.is_open = true;

        let intents = reconcile(
            vec![bug(90).tags(&["gfx"]).build(), resolved, bug(10).tags(&["gfx"]).build()],
            &[label("BZ_gfx", None)],
            &[mirror],
        )
        .await;

        let keys: Vec<(u64, IntentKind)> = intents.iter().map(|i| (i.bug().0, i.kind())).collect();
        assert_eq!(
            keys,
            vec![
                (10, IntentKind::CreateIssue),
                (50, IntentKind::UpdateLabels),
                (50, IntentKind::SetOpenState),
                (90, IntentKind::CreateIssue),
            ]
        );
    }

    #[test]
    fn mirror_index_ignores_issues_without_marker() {
        let source = bug(1).build();
        let mut unmarked = mirror_of(&source, 2, &["bugzilla"]);
        unmarked.source_id = None;
        let marked = mirror_of(&source, 3, &["bugzilla"]);
        let issues = [unmarked, marked];
        let index = MirrorIndex::build(&issues);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(BugId(1)).map(|i| i.number), Some(3));
        assert_eq!(index.open_sources(), vec![BugId(1)]);
    }

    #[test]
    fn mirror_index_prefers_open_mirror() {
        let source = bug(100).build();
        let mut closed = mirror_of(&source, 4, &["bugzilla"]);
        closed.is_open = false;
        let issues = [closed, mirror_of(&source, 9, &["bugzilla"])];

        let index = MirrorIndex::build(&issues);

        assert_eq!(index.get(BugId(100)).map(|i| i.number), Some(9));
        assert_eq!(index.open_sources(), vec![BugId(100)]);
    }
}
