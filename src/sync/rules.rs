//! Rule resolution: prefixed repository labels become [`SyncRule`]s.
//!
//! A label `BZ_wr-android` selects bugs tagged `wr-android` on the
//! whiteboard; `BZ_1234` selects bug 1234 and everything it depends on. A
//! `[project=NAME]` annotation in the label description places selected
//! issues on that project board.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{BugId, LabelInfo, RuleSelector, SyncRule};

/// A prefixed label that could not be turned into a usable rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleWarning {
    /// Offending label name.
    pub label: String,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// Immutable rule set for one run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    prefix: String,
    rules: Vec<SyncRule>,
    warnings: Vec<RuleWarning>,
    ignored: BTreeSet<String>,
}

impl RuleSet {
    /// Rules in label order.
    #[must_use]
    pub fn rules(&self) -> &[SyncRule] {
        &self.rules
    }

    /// Configuration problems found while resolving.
    #[must_use]
    pub fn warnings(&self) -> &[RuleWarning] {
        &self.warnings
    }

    /// The sync prefix these rules were resolved with.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether reconciliation owns this label.
    ///
    /// Prefixed labels that were rejected as rules are left alone, like
    /// any foreign label.
    #[must_use]
    pub fn is_managed(&self, label: &str) -> bool {
        label.starts_with(&self.prefix) && !self.ignored.contains(label)
    }

    /// The rule mirroring onto `label`.
    #[must_use]
    pub fn rule_for_label(&self, label: &str) -> Option<&SyncRule> {
        self.rules.iter().find(|r| r.target_label == label)
    }

    /// Whether any rule places issues on a project board.
    #[must_use]
    pub fn has_projects(&self) -> bool {
        self.rules.iter().any(|r| r.project_name.is_some())
    }
}

fn project_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[project=([^\]]*)\]").expect("project regex must compile"))
}

fn is_tag_shaped(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || matches!(c, '[' | ']' | ':' | ',' | ';'))
}

fn parse_selector(remainder: &str) -> Result<RuleSelector, String> {
    if !remainder.is_empty() && remainder.bytes().all(|b| b.is_ascii_digit()) {
        return match remainder.parse::<u64>() {
            Ok(0) => Err("bug id 0 is not a valid bug".into()),
            Ok(id) => Ok(RuleSelector::DependencyClosure(BugId(id))),
            Err(e) => Err(format!("bug id {remainder} is out of range: {e}")),
        };
    }
    if is_tag_shaped(remainder) {
        return Ok(RuleSelector::WhiteboardTag(remainder.to_string()));
    }
    Err(format!("{remainder:?} is neither a bug id nor a whiteboard tag"))
}

/// Resolves the repository's labels into a [`RuleSet`].
///
/// Never fails: a malformed label is logged, recorded as a warning and
/// skipped.
#[must_use]
pub fn resolve_rules(labels: &[LabelInfo], prefix: &str) -> RuleSet {
    let mut rules = Vec::new();
    let mut warnings = Vec::new();
    let mut ignored = BTreeSet::new();
    let mut seen = BTreeSet::new();

    for label in labels {
        let Some(remainder) = label.name.strip_prefix(prefix) else {
            continue;
        };
        if !seen.insert(label.name.clone()) {
            continue;
        }

        let selector = match parse_selector(remainder) {
            Ok(selector) => selector,
            Err(message) => {
                tracing::warn!(label = %label.name, "skipping sync label: {message}");
                warnings.push(RuleWarning { label: label.name.clone(), message });
                ignored.insert(label.name.clone());
                continue;
            }
        };

        let mut project_name = None;
        if let Some(caps) = label.description.as_deref().and_then(|d| project_regex().captures(d)) {
            let name = caps[1].trim();
            if name.is_empty() {
                let message = "empty [project=] annotation; no board placement".to_string();
                tracing::warn!(label = %label.name, "{message}");
                warnings.push(RuleWarning { label: label.name.clone(), message });
            } else {
                project_name = Some(name.to_string());
            }
        }

        rules.push(SyncRule { selector, target_label: label.name.clone(), project_name });
    }

    tracing::debug!(rules = rules.len(), warnings = warnings.len(), "resolved sync rules");
    RuleSet { prefix: prefix.to_string(), rules, warnings, ignored }
}
