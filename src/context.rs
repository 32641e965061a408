//! Service context bundling the tracker port trait objects.

use std::path::Path;

use crate::adapters::live::{LiveBugTracker, LiveProjectTracker};
use crate::adapters::recording::{RecordingBugTracker, RecordingProjectTracker};
use crate::adapters::replaying::{ReplayingBugTracker, ReplayingProjectTracker};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::config::{Credentials, SyncConfig};
use crate::error::SyncError;
use crate::ports::{BugTracker, ProjectTracker};

/// Bundles both tracker ports into a single context.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying); the reconciliation code only sees the traits.
pub struct ServiceContext {
    /// Source of bugs.
    pub bugs: Box<dyn BugTracker>,
    /// Repository holding the mirror issues and boards.
    pub projects: Box<dyn ProjectTracker>,
}

impl ServiceContext {
    /// Creates a live context talking to the configured trackers.
    #[must_use]
    pub fn live(config: &SyncConfig, credentials: &Credentials) -> Self {
        Self {
            bugs: Box::new(LiveBugTracker::new(&config.bugzilla, credentials.bugzilla_api_key.clone())),
            projects: Box::new(LiveProjectTracker::new(&config.github, credentials.github_token.clone())),
        }
    }

    /// Creates a live context whose traffic is recorded into a new
    /// timestamped directory under `root`.
    ///
    /// The context must be dropped before [`RecordingSession::finish`] is
    /// called.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette directory cannot be created.
    pub fn recording_at(
        root: &Path,
        config: &SyncConfig,
        credentials: &Credentials,
    ) -> Result<(Self, RecordingSession), SyncError> {
        let session = RecordingSession::new(root)?;
        let live = Self::live(config, credentials);
        let ctx = Self {
            bugs: Box::new(RecordingBugTracker::new(live.bugs, session.bugzilla.clone())),
            projects: Box::new(RecordingProjectTracker::new(live.projects, session.github.clone())),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from the cassettes in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` holds no cassettes or one cannot be parsed.
    pub fn replaying(dir: &Path) -> Result<Self, SyncError> {
        Self::replaying_from(&CassetteConfig::from_dir(dir)?)
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// A port without a configured cassette fails every call.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, SyncError> {
        let replayers = config.load_all()?;

        Ok(Self {
            bugs: match replayers.bugzilla {
                Some(r) => Box::new(ReplayingBugTracker::new(r)),
                None => Box::new(ReplayingBugTracker::unconfigured()),
            },
            projects: match replayers.github {
                Some(r) => Box::new(ReplayingProjectTracker::new(r)),
                None => Box::new(ReplayingProjectTracker::unconfigured()),
            },
        })
    }

    /// Creates a context from arbitrary port implementations.
    #[must_use]
    pub fn from_parts(bugs: Box<dyn BugTracker>, projects: Box<dyn ProjectTracker>) -> Self {
        Self { bugs, projects }
    }
}
