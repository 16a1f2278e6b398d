//! File-system result store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{run_location, ResultStore};
use crate::{Error, Result};

/// Writes result tables as files.
///
/// In single-run mode every run overwrites `path`. With run identifiers
/// enabled, each run writes `<stem>_<RUNID>.<ext>` in the same directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    run_ids: bool,
}

impl FileStore {
    /// Create a single-run store that always writes to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_ids: false,
        }
    }

    /// Create a store that gives each run its own file next to `path`.
    #[must_use]
    pub fn with_run_ids(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_ids: true,
        }
    }

    /// Get the base path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for FileStore {
    fn supports_run_ids(&self) -> bool {
        self.run_ids
    }

    fn exists(&self, run_id: &str) -> Result<bool> {
        let location = self.location(Some(run_id));
        Ok(Path::new(&location).try_exists()?)
    }

    fn location(&self, run_id: Option<&str>) -> String {
        run_location(&self.path, run_id)
    }

    fn write(&self, location: &str, table: &str) -> Result<()> {
        fs::write(location, table).map_err(|source| Error::StorageWriteFailed {
            location: location.to_string(),
            source,
        })?;
        debug!(location, bytes = table.len(), "result table written");
        Ok(())
    }
}
