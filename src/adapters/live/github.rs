//! Live adapter for the `ProjectTracker` port using the GitHub REST API.
//!
//! Boards are classic projects: a project has columns, a column has cards,
//! and a card points at an issue through its API URL.

use std::collections::BTreeSet;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{send, send_json};
use crate::config::{GitHubConfig, OwnerKind};
use crate::error::TrackerError;
use crate::model::{marker, BoardColumn, Card, ColumnRef, LabelInfo, NewIssue, ProjectBoard, TargetIssue};
use crate::ports::{PortFuture, ProjectTracker};

const SERVICE: &str = "github";
const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";

/// Live project tracker for one repository and its owner's boards.
pub struct LiveProjectTracker {
    client: Client,
    api_url: String,
    repo: String,
    owner: String,
    owner_kind: OwnerKind,
    token: String,
}

impl LiveProjectTracker {
    /// Creates a tracker authenticating with `token`.
    #[must_use]
    pub fn new(config: &GitHubConfig, token: String) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            owner: config.board_owner().to_string(),
            owner_kind: config.owner_kind,
            token,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, concat!("bzsync/", env!("CARGO_PKG_VERSION")))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn issue_url(&self, number: u64) -> String {
        self.url(&format!("/repos/{}/issues/{number}", self.repo))
    }

    /// Reads every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>, TrackerError> {
        let mut items = Vec::new();
        for page in 1usize.. {
            let request =
                self.request(Method::GET, url).query(query).query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<T> = send_json(SERVICE, request, what).await?;
            let last = batch.len() < PER_PAGE;
            items.extend(batch);
            if last {
                break;
            }
        }
        Ok(items)
    }

    /// Sends a write and discards the response body.
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        what: &str,
    ) -> Result<(), TrackerError> {
        send(SERVICE, self.request(method, url).json(body), what).await?;
        Ok(())
    }

    fn projects_url(&self) -> String {
        match self.owner_kind {
            OwnerKind::Org => self.url(&format!("/orgs/{}/projects", self.owner)),
            OwnerKind::User => self.url(&format!("/users/{}/projects", self.owner)),
        }
    }

    async fn load_board(&self, project: ApiProject) -> Result<ProjectBoard, TrackerError> {
        let columns_url = self.url(&format!("/projects/{}/columns", project.id));
        let columns: Vec<ColumnRef> = self.get_all(&columns_url, &[], &format!("columns of {}", project.name)).await?;

        let mut board = ProjectBoard { id: project.id, name: project.name, columns: Vec::with_capacity(columns.len()) };
        for column in columns {
            let cards_url = self.url(&format!("/projects/columns/{}/cards", column.id));
            let cards: Vec<Card> = self.get_all(&cards_url, &[], &format!("cards in {}", column.name)).await?;
            board.columns.push(BoardColumn { id: column.id, name: column.name, cards });
        }
        tracing::debug!(project = %board.name, columns = board.columns.len(), "loaded board");
        Ok(board)
    }
}

/// Issue as returned by the REST API.
#[derive(Deserialize)]
struct ApiIssue {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    state: String,
    #[serde(default)]
    assignee: Option<ApiUser>,
    url: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiProject {
    id: u64,
    name: String,
}

#[derive(Deserialize)]
struct ApiCardLocation {
    column_url: String,
}

impl From<ApiIssue> for TargetIssue {
    fn from(issue: ApiIssue) -> Self {
        let body = issue.body.unwrap_or_default();
        Self {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            source_id: marker::parse(&body),
            body,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            is_open: issue.state == "open",
            assignee: issue.assignee.map(|a| a.login),
            api_url: issue.url,
        }
    }
}

impl ProjectTracker for LiveProjectTracker {
    fn list_labels(&self) -> PortFuture<'_, Vec<LabelInfo>> {
        Box::pin(async move {
            let url = self.url(&format!("/repos/{}/labels", self.repo));
            let labels: Vec<LabelInfo> = self.get_all(&url, &[], "labels").await?;
            Ok(labels)
        })
    }

    fn list_issues_by_label(&self, label: &str) -> PortFuture<'_, Vec<TargetIssue>> {
        let label = label.to_string();
        Box::pin(async move {
            let url = self.url(&format!("/repos/{}/issues", self.repo));
            let issues: Vec<ApiIssue> =
                self.get_all(&url, &[("labels", label.as_str()), ("state", "all")], &format!("issues labeled {label}")).await?;
            Ok(issues.into_iter().filter(|i| i.pull_request.is_none()).map(TargetIssue::from).collect())
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TargetIssue> {
        let assignees: Vec<&String> = issue.assignee.iter().collect();
        let body = json!({
            "title": issue.title,
            "body": issue.body,
            "labels": issue.labels,
            "assignees": assignees,
        });
        Box::pin(async move {
            let url = self.url(&format!("/repos/{}/issues", self.repo));
            let request = self.request(Method::POST, &url).json(&body);
            let created: ApiIssue = send_json(SERVICE, request, "new issue").await?;
            Ok(created.into())
        })
    }

    fn update_content(&self, number: u64, title: &str, body: &str) -> PortFuture<'_, ()> {
        let payload = json!({ "title": title, "body": body });
        Box::pin(async move {
            self.write(Method::PATCH, &self.issue_url(number), &payload, &format!("issue #{number}")).await
        })
    }

    fn update_labels(&self, number: u64, labels: &BTreeSet<String>) -> PortFuture<'_, ()> {
        let payload = json!({ "labels": labels });
        Box::pin(async move {
            let url = format!("{}/labels", self.issue_url(number));
            self.write(Method::PUT, &url, &payload, &format!("issue #{number}")).await
        })
    }

    fn set_open_state(&self, number: u64, open: bool) -> PortFuture<'_, ()> {
        let payload = json!({ "state": if open { "open" } else { "closed" } });
        Box::pin(async move {
            self.write(Method::PATCH, &self.issue_url(number), &payload, &format!("issue #{number}")).await
        })
    }

    fn set_assignee(&self, number: u64, login: &str) -> PortFuture<'_, ()> {
        let payload = json!({ "assignees": [login] });
        Box::pin(async move {
            self.write(Method::PATCH, &self.issue_url(number), &payload, &format!("issue #{number}")).await
        })
    }

    fn add_comment(&self, number: u64, body: &str) -> PortFuture<'_, ()> {
        let payload = json!({ "body": body });
        Box::pin(async move {
            let url = format!("{}/comments", self.issue_url(number));
            self.write(Method::POST, &url, &payload, &format!("issue #{number}")).await
        })
    }

    fn list_project_boards(&self) -> PortFuture<'_, Vec<ProjectBoard>> {
        Box::pin(async move {
            let projects: Vec<ApiProject> =
                self.get_all(&self.projects_url(), &[("state", "open")], &format!("projects of {}", self.owner)).await?;
            let mut boards = Vec::with_capacity(projects.len());
            for project in projects {
                boards.push(self.load_board(project).await?);
            }
            Ok(boards)
        })
    }

    fn get_project_column(&self, card_id: u64) -> PortFuture<'_, ColumnRef> {
        Box::pin(async move {
            let what = format!("card {card_id}");
            let card_url = self.url(&format!("/projects/columns/cards/{card_id}"));
            let location: ApiCardLocation = send_json(SERVICE, self.request(Method::GET, &card_url), &what).await?;
            let column: ColumnRef = send_json(SERVICE, self.request(Method::GET, &location.column_url), &what).await?;
            Ok(column)
        })
    }

    fn move_card(&self, card_id: u64, column_id: u64) -> PortFuture<'_, ()> {
        let payload = json!({ "position": "bottom", "column_id": column_id });
        Box::pin(async move {
            let url = self.url(&format!("/projects/columns/cards/{card_id}/moves"));
            self.write(Method::POST, &url, &payload, &format!("card {card_id}")).await
        })
    }

    fn create_card(&self, column_id: u64, issue_id: u64) -> PortFuture<'_, Card> {
        let payload = json!({ "content_id": issue_id, "content_type": "Issue" });
        Box::pin(async move {
            let url = self.url(&format!("/projects/columns/{column_id}/cards"));
            let request = self.request(Method::POST, &url).json(&payload);
            let card: Card = send_json(SERVICE, request, &format!("column {column_id}")).await?;
            Ok(card)
        })
    }
}
