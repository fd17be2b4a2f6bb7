use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::task::Task;

/// Best-effort offline copy of the board, one JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached tasks, or `None` when there is nothing usable on disk.
    pub fn load(&self) -> Option<Vec<Task>> {
        if !self.path.exists() {
            return None;
        }
        match self.try_load() {
            Ok(tasks) => Some(tasks),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "Ignoring cached tasks");
                None
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, CacheError> {
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Failures are logged and swallowed.
    pub fn save(&self, tasks: &[Task]) {
        if let Err(error) = self.try_save(tasks) {
            tracing::warn!(path = %self.path.display(), %error, "Failed to save tasks");
        }
    }

    pub fn try_save(&self, tasks: &[Task]) -> Result<(), CacheError> {
        fs::write(&self.path, serde_json::to_string_pretty(tasks)?)?;
        Ok(())
    }
}
