//! Reconciliation of Bugzilla bugs into GitHub mirror issues.
//!
//! A run takes two snapshots, one per tracker, and computes the full list of
//! [`MutationIntent`]s from them before anything is written. Applying the
//! intents and then planning again yields an empty list.

pub mod apply;
pub mod board;
pub mod diff;
pub mod rules;
pub mod sources;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt::Write;

use crate::error::SyncError;
use crate::model::MutationIntent;
use crate::ports::{BugTracker, ProjectTracker};

pub use apply::{apply_intents, ApplyReport};
pub use diff::{plan_intents, MirrorIndex, ReconcileSettings};
pub use rules::{resolve_rules, RuleSet, RuleWarning};
pub use sources::{add_tracked_bugs, resolve_sources, Scope};

/// Result of planning one run.
#[derive(Debug)]
pub struct Plan {
    /// Rules resolved from the repository labels.
    pub rules: RuleSet,
    /// Number of bugs considered.
    pub bugs_in_scope: usize,
    /// Number of mirror issues found.
    pub mirrors: usize,
    /// What to change, in application order.
    pub intents: Vec<MutationIntent>,
}

/// Takes both snapshots and computes the intents.
///
/// # Errors
///
/// Returns [`SyncError::Unavailable`] if either tracker cannot be read. No
/// write has happened at that point.
pub async fn plan(
    bugs: &dyn BugTracker,
    projects: &dyn ProjectTracker,
    settings: &ReconcileSettings,
) -> Result<Plan, SyncError> {
    let labels = projects.list_labels().await.map_err(SyncError::github)?;
    let rules = resolve_rules(&labels, &settings.label_prefix);
    tracing::info!(rules = rules.rules().len(), warnings = rules.warnings().len(), "resolved sync rules");

    let issues = projects.list_issues_by_label(&settings.mirror_label).await.map_err(SyncError::github)?;
    let mirrors = MirrorIndex::build(&issues);
    tracing::info!(issues = issues.len(), mirrors = mirrors.len(), "listed mirror issues");

    let mut scope = resolve_sources(bugs, &rules).await?;
    add_tracked_bugs(bugs, &rules, &mut scope, &mirrors.open_sources()).await?;

    let boards = if rules.has_projects() {
        projects.list_project_boards().await.map_err(SyncError::github)?
    } else {
        Vec::new()
    };

    let intents = plan_intents(&scope, &rules, &mirrors, &boards, settings);
    tracing::info!(bugs = scope.len(), intents = intents.len(), "planned reconciliation");

    Ok(Plan { bugs_in_scope: scope.len(), mirrors: mirrors.len(), rules, intents })
}

/// Formats intents as a human-readable report.
#[must_use]
pub fn format_intents(intents: &[MutationIntent]) -> String {
    if intents.is_empty() {
        return "No changes needed.".to_string();
    }
    intents.iter().map(|i| format!("  {i}")).collect::<Vec<_>>().join("\n")
}

/// Formats a rule set, warnings included.
#[must_use]
pub fn format_rules(rules: &RuleSet) -> String {
    let mut out = String::new();
    if rules.rules().is_empty() {
        let _ = writeln!(out, "No labels with prefix {} define sync rules.", rules.prefix());
    }
    for rule in rules.rules() {
        let _ = writeln!(out, "  {rule}");
    }
    if !rules.warnings().is_empty() {
        let _ = writeln!(out, "Warnings:");
        for warning in rules.warnings() {
            let _ = writeln!(out, "  {warning}");
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::config::SyncPolicy;
    use crate::error::TrackerError;
    use crate::model::{Card, ColumnRef, IntentKind, LabelInfo, NewIssue, ProjectBoard, TargetIssue};
    use crate::ports::PortFuture;
    use crate::sync::testing::{board, bug, issue_url, label, mirror_of, FakeBugTracker, FakeProjectTracker, BZ_URL};

    fn settings() -> ReconcileSettings {
        ReconcileSettings {
            mirror_label: "bugzilla".into(),
            bugzilla_url: BZ_URL.into(),
            repo: "mozilla/gfx".into(),
            label_prefix: "BZ_".into(),
            policy: SyncPolicy::default(),
            identities: BTreeMap::from([("dev@mozilla.com".into(), "devgh".into())]),
        }
    }

    fn world() -> (FakeBugTracker, FakeProjectTracker) {
        let resolved = bug(300).tags(&["gfx"]).resolved("FIXED").build();
        let mut resolved_mirror = mirror_of(&resolved, 3, &["bugzilla", "BZ_gfx"]);
        resolved_mirror.is_open = true;
        let stale = bug(400).build();
        let stale_mirror = mirror_of(&stale, 4, &["bugzilla", "BZ_gfx", "P2"]);

        let mut graphics = board(5, "Graphics", &["To do", "In progress", "Sprint 3", "Done"]);
        graphics.columns[1].cards.push(Card { id: 33, content_url: Some(issue_url(3)) });

        let bugs = FakeBugTracker::new(vec![
            bug(100).tags(&["gfx"]).assigned("dev@mozilla.com").build(),
            bug(101).depends_on(&[102]).build(),
            bug(102).depends_on(&[101]).tags(&["gfx"]).build(),
            resolved,
            stale,
        ]);
        let projects = FakeProjectTracker::new(
            vec![
                label("bugzilla", None),
                label("P2", None),
                label("BZ_gfx", Some("Graphics [project=Graphics]")),
                label("BZ_101", None),
            ],
            vec![resolved_mirror, stale_mirror],
            vec![graphics],
        );
        (bugs, projects)
    }

    #[tokio::test]
    async fn applying_a_plan_converges() {
        let (bugs, projects) = world();

        let first = plan(&bugs, &projects, &settings()).await.unwrap();
        assert!(!first.intents.is_empty());
        assert_eq!(first.mirrors, 2);
        let report = apply_intents(&projects, &first.intents, settings().policy).await;
        assert_eq!(report.failed, 0, "{report}");

        let second = plan(&bugs, &projects, &settings()).await.unwrap();
        assert!(second.intents.is_empty(), "{}", format_intents(&second.intents));
    }

    #[tokio::test]
    async fn first_plan_covers_every_bug() {
        let (bugs, projects) = world();
        let plan = plan(&bugs, &projects, &settings()).await.unwrap();
        let keys: Vec<(u64, IntentKind)> = plan.intents.iter().map(|i| (i.bug().0, i.kind())).collect();

        assert_eq!(
            keys,
            vec![
                (100, IntentKind::CreateIssue),
                (100, IntentKind::MoveCard),
                (101, IntentKind::CreateIssue),
                (102, IntentKind::CreateIssue),
                (102, IntentKind::MoveCard),
                (300, IntentKind::SetOpenState),
                (300, IntentKind::MoveCard),
                (400, IntentKind::UpdateLabels),
            ]
        );
        assert_eq!(plan.bugs_in_scope, 5);
    }

    #[tokio::test]
    async fn second_run_after_partial_failure_retries_the_rest() {
        let (bugs, projects) = world();
        projects.fail_on("update_labels");
        let first = plan(&bugs, &projects, &settings()).await.unwrap();
        let report = apply_intents(&projects, &first.intents, settings().policy).await;
        assert_eq!(report.failed, 1);

        projects.clear_failures();
        let retry = plan(&bugs, &projects, &settings()).await.unwrap();
        assert_eq!(retry.intents.len(), 1);
        assert_eq!(retry.intents[0].kind(), IntentKind::UpdateLabels);
    }

    #[tokio::test]
    async fn description_with_jira_lines_converges() {
        let quoting = bug(500).tags(&["gfx"]).description("Steps\n\u{2506}quoted jira line").build();
        let bugs = FakeBugTracker::new(vec![quoting]);
        let labels = vec![label("bugzilla", None), label("BZ_gfx", None)];
        let projects = FakeProjectTracker::new(labels, vec![], vec![]);

        let first = plan(&bugs, &projects, &settings()).await.unwrap();
        let report = apply_intents(&projects, &first.intents, settings().policy).await;
        assert_eq!(report.failed, 0, "{report}");

        let second = plan(&bugs, &projects, &settings()).await.unwrap();
        assert!(second.intents.is_empty(), "{}", format_intents(&second.intents));
        assert_eq!(projects.issue(1).body.matches("\u{2506}quoted jira line").count(), 1);
    }

    struct DownProjects;

    impl ProjectTracker for DownProjects {
        fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>> {
            let err: Result<Vec<LabelInfo>, TrackerError> =
                Err(TrackerError::Transport { service: "github", message: "unreachable".into() });
            Box::pin(async move { err })
        }
        fn list_issues_by_label(&self, _: &str) -> PortFuture<'_, Vec<TargetIssue>> {
            unreachable!()
        }
        fn create_issue(&self, _: &NewIssue) -> PortFuture<'_, TargetIssue> {
            unreachable!()
        }
        fn update_content(&self, _: u64, _: &str, _: &str) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn update_labels(&self, _: u64, _: &BTreeSet<String>) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn set_open_state(&self, _: u64, _: bool) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn set_assignee(&self, _: u64, _: &str) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn add_comment(&self, _: u64, _: &str) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>> {
            unreachable!()
        }
        fn get_project_column(&self, _: u64) -> PortFuture<'_, ColumnRef> {
            unreachable!()
        }
        fn move_card(&self, _: u64, _: u64) -> PortFuture<'_, ()> {
            unreachable!()
        }
        fn create_card(&self, _: u64, _: u64) -> PortFuture<'_, Card> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn unreachable_tracker_aborts_before_any_write() {
        let (bugs, _) = world();
        let err = plan(&bugs, &DownProjects, &settings()).await.unwrap_err();
        assert!(matches!(err, SyncError::Unavailable { tracker: "GitHub", .. }));
        assert_eq!(bugs.calls_to("query gfx"), 0);
    }

    #[test]
    fn format_intents_empty() {
        assert_eq!(format_intents(&[]), "No changes needed.");
    }

    #[test]
    fn format_rules_lists_rules_and_warnings() {
        let rules = resolve_rules(
            &[label("BZ_gfx", Some("[project=Graphics]")), label("BZ_bad tag", None)],
            "BZ_",
        );
        let out = format_rules(&rules);
        assert!(out.contains("BZ_gfx: whiteboard tag gfx (project Graphics)"));
        assert!(out.contains("Warnings:"));
        assert!(out.contains("BZ_bad tag"));
    }
}
