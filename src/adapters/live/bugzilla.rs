//! Live adapter for the `BugTracker` port using the Bugzilla REST API.
//!
//! Bugs are read in two passes. The authenticated pass, which may see
//! confidential bugs, only asks for fields that are safe to publish. Titles,
//! assignees and descriptions come from a second, unauthenticated pass, so a
//! confidential bug simply lacks them.

use std::collections::{BTreeSet, HashMap};

use reqwest::Client;
use serde::Deserialize;

use super::send_json;
use crate::config::BugzillaConfig;
use crate::error::TrackerError;
use crate::model::{whiteboard_tags, BugId, SourceIssue};
use crate::ports::{BugTracker, PortFuture};

const SERVICE: &str = "bugzilla";

/// Fields requested with the API key.
const AUTH_FIELDS: &str = "id,is_open,status,resolution,whiteboard,depends_on,see_also";

/// Fields requested without credentials.
const PUBLIC_FIELDS: &str = "id,summary,assigned_to";

/// Live bug tracker backed by a Bugzilla instance.
pub struct LiveBugTracker {
    client: Client,
    base_url: String,
    products: Vec<String>,
    unassigned: Vec<String>,
    api_key: Option<String>,
}

impl LiveBugTracker {
    /// Creates a tracker for the configured instance. Without `api_key`
    /// confidential bugs are invisible.
    #[must_use]
    pub fn new(config: &BugzillaConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            products: config.products.clone(),
            unassigned: config.unassigned.clone(),
            api_key,
        }
    }

    fn bug_url(&self) -> String {
        format!("{}/rest/bug", self.base_url)
    }

    /// Authenticated query returning only publishable fields.
    async fn query_auth(&self, filter: &[(&str, String)], what: &str) -> Result<Vec<AuthBug>, TrackerError> {
        let mut request = self.client.get(self.bug_url()).query(&[("include_fields", AUTH_FIELDS)]).query(filter);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key)]);
        }
        let list: BugList<AuthBug> = send_json(SERVICE, request, what).await?;
        Ok(list.bugs)
    }

    /// Unauthenticated query; confidential bugs are silently left out.
    async fn query_public(&self, ids: &[u64]) -> Result<Vec<PublicBug>, TrackerError> {
        let filter: Vec<(&str, String)> = ids.iter().map(|id| ("id", id.to_string())).collect();
        let request = self.client.get(self.bug_url()).query(&[("include_fields", PUBLIC_FIELDS)]).query(&filter);
        let list: BugList<PublicBug> = send_json(SERVICE, request, "public bug fields").await?;
        Ok(list.bugs)
    }

    /// First comment of each bug. Only public bugs may be passed: one
    /// confidential id fails the whole request.
    async fn first_comments(&self, ids: &[u64]) -> Result<HashMap<u64, String>, TrackerError> {
        let Some((first, rest)) = ids.split_first() else {
            return Ok(HashMap::new());
        };
        let others: Vec<(&str, String)> = rest.iter().map(|id| ("ids", id.to_string())).collect();
        let request = self.client.get(format!("{}/{first}/comment", self.bug_url())).query(&others);
        let response: CommentsResponse = send_json(SERVICE, request, "bug comments").await?;

        Ok(response
            .bugs
            .into_iter()
            .filter_map(|(id, bug)| {
                let id = id.parse().ok()?;
                let text = bug.comments.into_iter().next()?.text;
                Some((id, text))
            })
            .collect())
    }

    async fn fetch(&self, filter: &[(&str, String)], what: &str) -> Result<Vec<SourceIssue>, TrackerError> {
        let auth = self.query_auth(filter, what).await?;
        if auth.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<u64> = auth.iter().map(|b| b.id).collect();
        let public: HashMap<u64, PublicBug> =
            self.query_public(&ids).await?.into_iter().map(|b| (b.id, b)).collect();
        let public_ids: Vec<u64> = ids.iter().copied().filter(|id| public.contains_key(id)).collect();
        let mut comments = self.first_comments(&public_ids).await?;
        tracing::debug!(bugs = ids.len(), public = public_ids.len(), "fetched {what}");

        Ok(auth
            .into_iter()
            .map(|bug| {
                let id = bug.id;
                merge(bug, public.get(&id), comments.remove(&id), &self.unassigned)
            })
            .collect())
    }

    fn whiteboard_filter(&self, tag: &str) -> Vec<(&'static str, String)> {
        let mut filter: Vec<(&str, String)> = self.products.iter().map(|p| ("product", p.clone())).collect();
        filter.push(("status_whiteboard_type", "anywords".into()));
        filter.push(("status_whiteboard", tag.to_string()));
        filter.push(("resolution", "---".into()));
        filter
    }
}

#[derive(Deserialize)]
struct BugList<T> {
    bugs: Vec<T>,
}

/// Bug fields fetched with the API key.
#[derive(Deserialize)]
struct AuthBug {
    id: u64,
    is_open: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    resolution: String,
    #[serde(default)]
    whiteboard: String,
    #[serde(default)]
    depends_on: Vec<u64>,
    #[serde(default)]
    see_also: Vec<String>,
}

/// Bug fields fetched without credentials.
#[derive(Deserialize)]
struct PublicBug {
    id: u64,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
}

#[derive(Deserialize)]
struct CommentsResponse {
    bugs: HashMap<String, BugComments>,
}

#[derive(Deserialize)]
struct BugComments {
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct Comment {
    text: String,
}

fn id_filter(ids: &[BugId]) -> Vec<(&'static str, String)> {
    ids.iter().map(|id| ("id", id.to_string())).collect()
}

fn merge(bug: AuthBug, public: Option<&PublicBug>, description: Option<String>, unassigned: &[String]) -> SourceIssue {
    let assignee = public
        .and_then(|p| p.assigned_to.clone())
        .filter(|a| !a.is_empty() && !unassigned.iter().any(|u| u.eq_ignore_ascii_case(a)));

    SourceIssue {
        id: BugId(bug.id),
        summary: public.and_then(|p| p.summary.clone()),
        description,
        is_open: bug.is_open,
        status: bug.status,
        resolution: Some(bug.resolution).filter(|r| !r.is_empty()),
        assignee,
        whiteboard_tags: whiteboard_tags(&bug.whiteboard),
        dependency_ids: bug.depends_on.into_iter().map(BugId).collect::<BTreeSet<_>>(),
        see_also: bug.see_also,
    }
}

impl BugTracker for LiveBugTracker {
    fn query_by_whiteboard_tag(&self, tag: &str) -> PortFuture<'_, Vec<SourceIssue>> {
        let filter = self.whiteboard_filter(tag);
        let what = format!("bugs tagged {tag}");
        Box::pin(async move { self.fetch(&filter, &what).await })
    }

    fn get_bug(&self, id: BugId) -> PortFuture<'_, SourceIssue> {
        Box::pin(async move {
            let what = format!("bug {id}");
            self.fetch(&[("id", id.to_string())], &what)
                .await?
                .into_iter()
                .find(|bug| bug.id == id)
                .ok_or(TrackerError::NotFound(what))
        })
    }

    fn get_bugs(&self, ids: &[BugId]) -> PortFuture<'_, Vec<SourceIssue>> {
        let filter = id_filter(ids);
        let what = format!("{} bugs by id", ids.len());
        Box::pin(async move {
            // An empty filter would match every bug on the instance.
            if filter.is_empty() {
                return Ok(Vec::new());
            }
            self.fetch(&filter, &what).await
        })
    }

    fn get_dependencies(&self, id: BugId) -> PortFuture<'_, Vec<BugId>> {
        Box::pin(async move {
            let what = format!("bug {id}");
            let bug = self
                .query_auth(&[("id", id.to_string())], &what)
                .await?
                .into_iter()
                .find(|bug| bug.id == id.0)
                .ok_or(TrackerError::NotFound(what))?;
            Ok(bug.depends_on.into_iter().map(BugId).collect())
        })
    }
}
