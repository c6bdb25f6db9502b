use crate::persistence::{PersistenceError, PersistenceResult};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default preferences file name, relative to the working directory.
pub const DEFAULT_PREFERENCES_FILE: &str = "study-viewer.json";

/// Environment variable overriding the preferences file location.
pub const PREFERENCES_ENV: &str = "STUDY_VIEWER_PREFS";

/// User preferences persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    default_study: Option<PathBuf>,
}

impl Preferences {
    /// Load preferences from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> PersistenceResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No preferences file, using defaults");
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> PersistenceResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The study opened when none is named explicitly.
    pub fn default_study(&self) -> Option<&Path> {
        self.default_study.as_deref()
    }

    pub fn set_default_study(&mut self, path: impl Into<PathBuf>) {
        self.default_study = Some(path.into());
    }

    pub fn clear_default_study(&mut self) {
        self.default_study = None;
    }
}
