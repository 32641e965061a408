//! Bug tracker records.

use std::collections::BTreeSet;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric Bugzilla bug identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BugId(pub u64);

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BugId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Snapshot of one Bugzilla bug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceIssue {
    /// Bug number.
    pub id: BugId,
    /// One-line summary. `None` for confidential bugs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// First comment. `None` for confidential bugs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether Bugzilla considers the bug open.
    pub is_open: bool,
    /// Raw status field (e.g. `NEW`, `RESOLVED`).
    pub status: String,
    /// Resolution of a closed bug (e.g. `FIXED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Assignee email, `None` when unassigned or hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Tags parsed from the status whiteboard.
    #[serde(default)]
    pub whiteboard_tags: BTreeSet<String>,
    /// Bugs this bug depends on.
    #[serde(default)]
    pub dependency_ids: BTreeSet<BugId>,
    /// "See also" URLs.
    #[serde(default)]
    pub see_also: Vec<String>,
}

impl SourceIssue {
    /// Title to use for the mirror issue.
    #[must_use]
    pub fn mirror_title(&self) -> &str {
        self.summary.as_deref().unwrap_or("Confidential Bugzilla issue")
    }

    /// Description to use for the mirror issue, without the sync marker.
    #[must_use]
    pub fn mirror_description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or("No description is available for this confidential bugzilla issue.")
    }
}

/// Splits a raw status whiteboard into tags.
///
/// Bugzilla whiteboards use ad-hoc syntax such as `[gfx-noted] [fenix:p1]`.
/// Tags are split on whitespace, `,` and `;`, and the bracket and colon
/// characters are dropped, so that example yields `gfx-noted` and `fenixp1`.
#[must_use]
pub fn whiteboard_tags(raw: &str) -> BTreeSet<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|token| token.chars().filter(|c| !matches!(c, '[' | ']' | ':')).collect::<String>())
        .filter(|tag| !tag.is_empty())
        .collect()
}
