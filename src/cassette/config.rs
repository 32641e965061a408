//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::format::Cassette;
use super::replayer::CassetteReplayer;
use super::{BUGZILLA_PORT, GITHUB_PORT};
use crate::error::SyncError;

/// Per-port cassette file paths. A port without a cassette answers every
/// call with an error during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the bug tracker cassette file.
    pub bugzilla: Option<PathBuf>,
    /// Path to the project tracker cassette file.
    pub github: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the bug tracker.
    pub bugzilla: Option<Arc<Mutex<CassetteReplayer>>>,
    /// Replayer for the project tracker.
    pub github: Option<Arc<Mutex<CassetteReplayer>>>,
}

/// File name of a port's cassette inside a recording directory.
#[must_use]
pub fn cassette_file_name(port: &str) -> String {
    format!("{port}.cassette.yaml")
}

impl CassetteConfig {
    /// Picks up the per-port cassettes a recording session left in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` holds neither cassette.
    pub fn from_dir(dir: &Path) -> Result<Self, SyncError> {
        let existing = |port: &str| Some(dir.join(cassette_file_name(port))).filter(|p| p.is_file());
        let config = Self { bugzilla: existing(BUGZILLA_PORT), github: existing(GITHUB_PORT) };
        if config.bugzilla.is_none() && config.github.is_none() {
            return Err(SyncError::Cassette(format!("no cassettes found in {}", dir.display())));
        }
        Ok(config)
    }

    /// Load a single cassette file and create a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, SyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Cassette(format!("Failed to read cassette file {}: {e}", path.display()))
        })?;
        let cassette: Cassette = serde_yaml::from_str(&content).map_err(|e| {
            SyncError::Cassette(format!("Failed to parse cassette file {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), interactions = cassette.interactions.len(), "loaded cassette");
        Ok(CassetteReplayer::new(&cassette))
    }

    /// Load all configured cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, SyncError> {
        let load = |path: &Option<PathBuf>| {
            path.as_deref()
                .map(|p| Self::load_cassette(p).map(|r| Arc::new(Mutex::new(r))))
                .transpose()
        };
        Ok(PortReplayers { bugzilla: load(&self.bugzilla)?, github: load(&self.github)? })
    }
}
