//! Source resolution: expand rules into the set of bugs in scope.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::SyncError;
use crate::model::{BugId, RuleSelector, SourceIssue, SyncRule};
use crate::ports::BugTracker;

use super::rules::RuleSet;

/// Bugs in scope for one run, with the rule labels selecting each.
///
/// A bug selected by several rules carries the union of their labels. Bugs
/// fetched only because a mirror issue points at them may carry no label.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bugs: BTreeMap<BugId, SourceIssue>,
    members: BTreeMap<BugId, BTreeSet<String>>,
}

impl Scope {
    /// Bugs in ascending id order.
    pub fn bugs(&self) -> impl Iterator<Item = &SourceIssue> {
        self.bugs.values()
    }

    /// Looks up one bug.
    #[must_use]
    pub fn get(&self, id: BugId) -> Option<&SourceIssue> {
        self.bugs.get(&id)
    }

    /// Whether the bug has been fetched.
    #[must_use]
    pub fn contains(&self, id: BugId) -> bool {
        self.bugs.contains_key(&id)
    }

    /// Number of bugs fetched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bugs.len()
    }

    /// Whether no bug is in scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }

    /// Target labels of every rule selecting the bug.
    #[must_use]
    pub fn labels_for(&self, id: BugId) -> BTreeSet<String> {
        self.members.get(&id).cloned().unwrap_or_default()
    }

    /// Bugs selected by one rule, in ascending id order.
    #[must_use]
    pub fn selected_by(&self, rule: &SyncRule) -> Vec<&SourceIssue> {
        self.members
            .iter()
            .filter(|(_, labels)| labels.contains(&rule.target_label))
            .filter_map(|(id, _)| self.bugs.get(id))
            .collect()
    }

    fn insert(&mut self, bug: SourceIssue) {
        self.bugs.insert(bug.id, bug);
    }

    fn add_member(&mut self, id: BugId, label: &str) {
        self.members.entry(id).or_default().insert(label.to_string());
    }

    /// Whiteboard membership is a property of the bug's tags, not only of
    /// the query that found it.
    fn apply_tag_membership(&mut self, rules: &RuleSet) {
        for rule in rules.rules() {
            let RuleSelector::WhiteboardTag(tag) = &rule.selector else {
                continue;
            };
            let tagged: Vec<BugId> = self
                .bugs
                .values()
                .filter(|bug| bug.whiteboard_tags.contains(tag))
                .map(|bug| bug.id)
                .collect();
            for id in tagged {
                self.add_member(id, &rule.target_label);
            }
        }
    }
}

/// Expands every rule into the bugs it selects.
///
/// # Errors
///
/// Returns [`SyncError::Unavailable`] if a whiteboard query fails, or a
/// dependency walk fails for a reason other than a missing bug. Reconciling
/// against a partial scope would strip labels from issues that should keep
/// them, so the run must stop.
pub async fn resolve_sources(tracker: &dyn BugTracker, rules: &RuleSet) -> Result<Scope, SyncError> {
    let mut scope = Scope::default();

    for rule in rules.rules() {
        match &rule.selector {
            RuleSelector::WhiteboardTag(tag) => {
                let bugs = tracker.query_by_whiteboard_tag(tag).await.map_err(SyncError::bugzilla)?;
                tracing::info!(label = %rule.target_label, count = bugs.len(), "whiteboard query");
                for bug in bugs {
                    scope.add_member(bug.id, &rule.target_label);
                    scope.insert(bug);
                }
            }
            RuleSelector::DependencyClosure(root) => {
                let count = expand_closure(tracker, *root, &rule.target_label, &mut scope).await?;
                tracing::info!(label = %rule.target_label, count, "dependency closure");
            }
        }
    }

    scope.apply_tag_membership(rules);
    Ok(scope)
}

/// Walks the dependency graph from `root`, adding every reachable bug to
/// `scope` under `label`. Each bug is visited at most once, so cycles
/// terminate. Returns the number of bugs reached.
async fn expand_closure(
    tracker: &dyn BugTracker,
    root: BugId,
    label: &str,
    scope: &mut Scope,
) -> Result<usize, SyncError> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([root]);
    let mut reached = 0;

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }

        if !scope.contains(id) {
            match tracker.get_bug(id).await {
                Ok(bug) => scope.insert(bug),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(bug = %id, label, "skipping inaccessible bug in closure: {e}");
                    continue;
                }
                Err(e) => return Err(SyncError::bugzilla(e)),
            }
        }
        scope.add_member(id, label);
        reached += 1;

        let dependencies = match tracker.get_dependencies(id).await {
            Ok(deps) => deps,
            Err(e) if e.is_not_found() => {
                tracing::warn!(bug = %id, "dependencies not visible: {e}");
                Vec::new()
            }
            Err(e) => return Err(SyncError::bugzilla(e)),
        };
        queue.extend(dependencies.into_iter().filter(|dep| !visited.contains(dep)));
    }

    Ok(reached)
}

/// Fetches bugs that open mirror issues point at but no rule selected, so
/// that those mirrors still converge (typically: get closed). All of them
/// are requested in a single batch.
///
/// Bugs that no longer exist or are not visible are skipped with a warning.
///
/// # Errors
///
/// Returns [`SyncError::Unavailable`] if the batch request fails.
pub async fn add_tracked_bugs(
    tracker: &dyn BugTracker,
    rules: &RuleSet,
    scope: &mut Scope,
    ids: &[BugId],
) -> Result<(), SyncError> {
    let missing: Vec<BugId> = ids.iter().copied().filter(|id| !scope.contains(*id)).collect();
    if missing.is_empty() {
        return Ok(());
    }
    tracing::info!(count = missing.len(), "fetching bugs of mirrors outside rule scope");

    let fetched = tracker.get_bugs(&missing).await.map_err(SyncError::bugzilla)?;
    for bug in fetched {
        scope.insert(bug);
    }
    for id in missing.into_iter().filter(|id| !scope.contains(*id)) {
        tracing::warn!(bug = %id, "mirrored bug is not accessible");
    }

    scope.apply_tag_membership(rules);
    Ok(())
}
