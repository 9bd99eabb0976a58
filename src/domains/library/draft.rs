//! Preview draft persistence.
//!
//! A preview that has not been committed yet is kept as a single JSON file at
//! a fixed per-user path, so an approving caller can commit it later without
//! re-deriving anything. The file is overwritten wholesale on every preview
//! and deleted on a successful commit. There is no isolation between
//! concurrent callers: last write wins.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use super::error::LibraryError;
use crate::storage::UseCase;

/// A generated draft awaiting approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDraft {
    pub use_case: UseCase,
    pub summary: String,
    pub prompt_template: String,
    pub history: String,
    /// The conversation JSON exactly as the caller supplied it.
    pub conversation_json: String,
    pub task_description: Option<String>,
}

/// File-backed store for the pending draft.
pub struct DraftCache {
    path: PathBuf,
}

impl DraftCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the draft file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the draft, replacing any previous one.
    pub fn store(&self, draft: &PendingDraft) -> Result<(), LibraryError> {
        let json = serde_json::to_string_pretty(draft)
            .map_err(|e| LibraryError::draft(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            LibraryError::draft(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        info!("Stored preview draft at {}", self.path.display());
        Ok(())
    }

    /// Read the pending draft, if one exists.
    pub fn load(&self) -> Result<Option<PendingDraft>, LibraryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LibraryError::draft(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        let draft = serde_json::from_str(&json)
            .map_err(|e| LibraryError::draft(format!("malformed draft file: {}", e)))?;
        Ok(Some(draft))
    }

    /// Remove the draft file. Removing an absent file is not an error.
    pub fn clear(&self) -> Result<(), LibraryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared preview draft at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LibraryError::draft(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
