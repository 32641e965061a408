//! Run configuration.
//!
//! Loaded once at startup from a YAML file into an immutable [`SyncConfig`].
//! Secrets are not part of the file; they come from the environment (after
//! `.env` is loaded) as [`Credentials`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::SyncError;

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "bzsync.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Target repository settings.
    pub github: GitHubConfig,
    /// Source tracker settings.
    #[serde(default)]
    pub bugzilla: BugzillaConfig,
    /// Bugzilla account to GitHub login mapping.
    #[serde(default)]
    pub identities: Vec<IdentityMapping>,
    /// Behavior switches for ambiguous cases.
    #[serde(default)]
    pub policy: SyncPolicy,
}

/// Whether project boards belong to an organization or a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// `/orgs/{owner}/projects`.
    #[default]
    Org,
    /// `/users/{owner}/projects`.
    User,
}

/// GitHub settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// Repository in `owner/name` form.
    pub repo: String,
    /// Owner of the project boards. Defaults to the repository owner.
    #[serde(default)]
    pub owner: Option<String>,
    /// Kind of board owner.
    #[serde(default)]
    pub owner_kind: OwnerKind,
    /// REST API base URL.
    #[serde(default = "default_github_api")]
    pub api_url: String,
    /// Label carried by every mirror issue.
    #[serde(default = "default_mirror_label")]
    pub mirror_label: String,
    /// Prefix marking labels that define sync rules.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
}

impl GitHubConfig {
    /// Board owner, falling back to the repository owner.
    #[must_use]
    pub fn board_owner(&self) -> &str {
        self.owner.as_deref().unwrap_or_else(|| self.repo.split('/').next().unwrap_or(""))
    }
}

/// Bugzilla settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BugzillaConfig {
    /// Base URL; the REST API lives under `/rest`.
    #[serde(default = "default_bugzilla_url")]
    pub url: String,
    /// Products searched by whiteboard rules.
    #[serde(default = "default_products")]
    pub products: Vec<String>,
    /// Placeholder accounts that mean "nobody is assigned".
    #[serde(default = "default_unassigned")]
    pub unassigned: Vec<String>,
}

impl Default for BugzillaConfig {
    fn default() -> Self {
        Self {
            url: default_bugzilla_url(),
            products: default_products(),
            unassigned: default_unassigned(),
        }
    }
}

/// One entry of the identity table.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityMapping {
    /// Bugzilla account email.
    pub bugzilla: String,
    /// GitHub login.
    pub github: String,
}

/// Policy switches for behavior the trackers leave ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncPolicy {
    /// Reopen a closed mirror issue when its bug is reopened.
    #[serde(default)]
    pub reopen: bool,
    /// Move cards out of custom columns when their issue closes.
    #[serde(default = "default_true")]
    pub done_overrides_custom_columns: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self { reopen: false, done_overrides_custom_columns: true }
    }
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}

fn default_mirror_label() -> String {
    "bugzilla".into()
}

fn default_label_prefix() -> String {
    "BZ_".into()
}

fn default_bugzilla_url() -> String {
    "https://bugzilla.mozilla.org".into()
}

fn default_products() -> Vec<String> {
    vec!["Core".into(), "Firefox".into(), "GeckoView".into()]
}

fn default_unassigned() -> Vec<String> {
    vec!["nobody@mozilla.org".into()]
}

fn default_true() -> bool {
    true
}

impl SyncConfig {
    /// Parses and validates a YAML config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a setting is invalid.
    pub fn from_yaml(path: &Path, yaml: &str) -> Result<Self, SyncError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|source| SyncError::ConfigParse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| SyncError::ConfigRead { path: path.to_path_buf(), source })?;
        Self::from_yaml(path, &contents)
    }

    fn validate(&self) -> Result<(), SyncError> {
        let parts: Vec<&str> = self.github.repo.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(SyncError::InvalidConfig(format!(
                "github.repo must be owner/name, got {:?}",
                self.github.repo
            )));
        }
        if self.github.label_prefix.is_empty() {
            return Err(SyncError::InvalidConfig("github.label_prefix must not be empty".into()));
        }
        if self.github.mirror_label.starts_with(&self.github.label_prefix) {
            return Err(SyncError::InvalidConfig(format!(
                "github.mirror_label {:?} must not start with the sync prefix {:?}",
                self.github.mirror_label, self.github.label_prefix
            )));
        }
        Ok(())
    }

    /// Identity table keyed by Bugzilla email.
    #[must_use]
    pub fn identity_map(&self) -> BTreeMap<String, String> {
        self.identities.iter().map(|m| (m.bugzilla.clone(), m.github.clone())).collect()
    }
}

/// Secrets read from the environment.
#[derive(Clone)]
pub struct Credentials {
    /// GitHub token (`GITHUB_TOKEN`).
    pub github_token: String,
    /// Bugzilla API key (`BZ_API_KEY`), needed to see confidential bugs.
    pub bugzilla_api_key: Option<String>,
}

impl Credentials {
    /// Reads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `GITHUB_TOKEN` is not set.
    pub fn from_env() -> Result<Self, SyncError> {
        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(SyncError::MissingCredential("GITHUB_TOKEN"))?;
        let bugzilla_api_key = std::env::var("BZ_API_KEY").ok().filter(|k| !k.is_empty());
        Ok(Self { github_token, bugzilla_api_key })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("bugzilla_api_key", &self.bugzilla_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
