//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::config::cassette_file_name;
use super::recorder::CassetteRecorder;
use super::{BUGZILLA_PORT, GITHUB_PORT};
use crate::error::SyncError;

/// Manages per-port `CassetteRecorder` instances for a recording session.
///
/// Each port gets its own recorder writing to a separate cassette file.
/// All cassettes are stored in a timestamped directory.
pub struct RecordingSession {
    /// Recorder for bug tracker interactions.
    pub bugzilla: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for project tracker interactions.
    pub github: Arc<Mutex<CassetteRecorder>>,
    /// Output directory containing all cassette files.
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session in `<root>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cassette directory already exists
    /// - The directory cannot be created
    pub fn new(root: &Path) -> Result<Self, SyncError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = root.join(&timestamp);

        if output_dir.exists() {
            return Err(SyncError::Cassette(format!(
                "Cassette directory already exists: {}",
                output_dir.display()
            )));
        }

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| SyncError::Cassette(format!("Failed to create cassette directory: {e}")))?;

        let make_recorder = |port: &str| -> Arc<Mutex<CassetteRecorder>> {
            let path = output_dir.join(cassette_file_name(port));
            Arc::new(Mutex::new(CassetteRecorder::new(path, format!("{timestamp}-{port}"))))
        };

        Ok(Self {
            bugzilla: make_recorder(BUGZILLA_PORT),
            github: make_recorder(GITHUB_PORT),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish all recorders and write cassette files to disk.
    ///
    /// The adapters holding the recorders must have been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if any cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, SyncError> {
        fn finish_one(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<(), SyncError> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| SyncError::Cassette(format!("Recording adapter for {port} still has references")))?
                .into_inner()
                .map_err(|e| SyncError::Cassette(format!("Recorder lock for {port} poisoned: {e}")))?;
            recorder
                .finish()
                .map_err(|e| SyncError::Cassette(format!("Failed to write {port} cassette: {e}")))?;
            Ok(())
        }

        finish_one(self.bugzilla, BUGZILLA_PORT)?;
        finish_one(self.github, GITHUB_PORT)?;

        Ok(self.output_dir)
    }
}
