//! On-disk form of a study's navigation state.
//!
//! A record is an explicit, versioned list of tagged cursors plus the
//! active mode, stored as JSON next to the study's images.

use crate::cursor::CursorSet;
use crate::enums::ViewMode;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RECORD_VERSION: u32 = 1;

/// Extension of the record file, named after the study.
pub const RECORD_EXTENSION: &str = "sdy";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported record version {0}")]
    UnsupportedVersion(u32),
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyRecord {
    version: u32,
    cursors: CursorSet,
    mode: ViewMode,
}

impl StudyRecord {
    pub fn new(cursors: CursorSet, mode: ViewMode) -> Self {
        Self {
            version: RECORD_VERSION,
            cursors,
            mode,
        }
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn into_parts(self) -> (CursorSet, ViewMode) {
        (self.cursors, self.mode)
    }

    /// True when this record holds exactly `cursors` and `mode`.
    pub fn matches(&self, cursors: &CursorSet, mode: ViewMode) -> bool {
        self.cursors == *cursors && self.mode == mode
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let record: Self = serde_json::from_str(json)?;
        if record.version != RECORD_VERSION {
            return Err(PersistenceError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read(path: &Path) -> PersistenceResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn write(&self, path: &Path) -> PersistenceResult<()> {
        fs::write(path, self.to_json()?).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
