//! In-memory result store using `DashMap`.
//!
//! Nothing is persisted across process restarts; useful for tests and for
//! embedding the engine where the caller ships tables elsewhere.

use std::path::PathBuf;

use dashmap::DashMap;

use super::{run_location, ResultStore};
use crate::Result;

/// In-memory store keyed by location.
pub struct MemoryStore {
    base: PathBuf,
    run_ids: bool,
    tables: DashMap<String, String>,
}

impl MemoryStore {
    /// Create a single-run store whose location is `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            run_ids: false,
            tables: DashMap::new(),
        }
    }

    /// Create a store that gives each run an identifier-suffixed location.
    #[must_use]
    pub fn with_run_ids(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            run_ids: true,
            tables: DashMap::new(),
        }
    }

    /// Get the table written at `location`.
    #[must_use]
    pub fn get(&self, location: &str) -> Option<String> {
        self.tables.get(location).map(|t| t.value().clone())
    }

    /// Get the number of stored tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("results.csv")
    }
}

impl ResultStore for MemoryStore {
    fn supports_run_ids(&self) -> bool {
        self.run_ids
    }

    fn exists(&self, run_id: &str) -> Result<bool> {
        Ok(self.tables.contains_key(&self.location(Some(run_id))))
    }

    fn location(&self, run_id: Option<&str>) -> String {
        run_location(&self.base, run_id)
    }

    fn write(&self, location: &str, table: &str) -> Result<()> {
        self.tables.insert(location.to_string(), table.to_string());
        Ok(())
    }
}
