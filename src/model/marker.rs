//! The body marker tying a GitHub issue back to its Bugzilla bug.
//!
//! The marker is the only durable link between the two trackers, so its
//! wording must stay stable: existing mirrors are found by matching it.

use std::sync::OnceLock;

use regex::Regex;

use super::source::BugId;

/// Lines starting with this character are written by an external Jira sync
/// and are kept when an issue body is rewritten.
pub const PRESERVED_LINE_MARKER: char = '\u{2506}';

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\x{1F41E} Issue is synchronized with Bugzilla \[Bug (\d+)\]")
            .expect("marker regex must compile")
    })
}

/// Renders the marker block appended to every mirror issue body.
#[must_use]
pub fn render(bug: BugId, bugzilla_url: &str) -> String {
    let base = bugzilla_url.trim_end_matches('/');
    format!(
        "\n\n---\n\u{1F41E} Issue is synchronized with Bugzilla [Bug {bug}]({base}/show_bug.cgi?id={bug})\n"
    )
}

/// Extracts the bug id from an issue body, if it carries the marker.
#[must_use]
pub fn parse(body: &str) -> Option<BugId> {
    marker_regex().captures(body).and_then(|caps| caps[1].parse().ok())
}

/// Builds the full desired body for a mirror issue.
///
/// `existing` is the current body of the mirror, if there is one. Preserved
/// lines that follow its marker are carried over. Lines before the marker
/// belong to the bug description and are rendered from `description` alone.
/// A trailing newline is kept so that trackers which append one do not
/// cause a perpetual update.
#[must_use]
pub fn compose_body(
    description: &str,
    bug: BugId,
    bugzilla_url: &str,
    existing: Option<&str>,
) -> String {
    let mut body = format!("{description}{}", render(bug, bugzilla_url));
    if let Some(existing) = existing {
        let tail = marker_regex().find(existing).map_or("", |m| &existing[m.end()..]);
        for line in tail.lines().filter(|l| l.starts_with(PRESERVED_LINE_MARKER)) {
            body.push('\n');
            body.push_str(line);
        }
        if existing.ends_with('\n') && !body.ends_with('\n') {
            body.push('\n');
        }
    }
    body
}
