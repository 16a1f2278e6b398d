//! Durable result stores
//!
//! A store resolves where a run's result table goes and writes it there.
//! Stores that support concurrent runs also answer whether a run
//! identifier is already taken, so each run lands at a distinct location.
//!
//! # Example
//!
//! ```rust
//! use factorial_trials::store::{MemoryStore, ResultStore};
//!
//! let store = MemoryStore::with_run_ids("results.csv");
//! let location = store.location(Some("Ab12Cd34"));
//! assert_eq!(location, "results_Ab12Cd34.csv");
//!
//! store.write(&location, "Trial,Mass,Response\n")?;
//! assert!(store.exists("Ab12Cd34")?);
//! # Ok::<(), factorial_trials::Error>(())
//! ```

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::Path;

use crate::Result;

/// Destination for finished result tables.
pub trait ResultStore {
    /// Whether runs get distinct, identifier-suffixed locations.
    ///
    /// Single-run stores overwrite one fixed location every run.
    fn supports_run_ids(&self) -> bool;

    /// Check if a result already exists under `run_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be queried.
    fn exists(&self, run_id: &str) -> Result<bool>;

    /// Resolve the location a run writes to.
    ///
    /// `run_id` is `None` for single-run stores.
    fn location(&self, run_id: Option<&str>) -> String;

    /// Write a finished table to `location`, replacing anything there.
    ///
    /// # Errors
    ///
    /// Returns `StorageWriteFailed` if the table cannot be persisted.
    fn write(&self, location: &str, table: &str) -> Result<()>;
}

impl<S: ResultStore + ?Sized> ResultStore for &S {
    fn supports_run_ids(&self) -> bool {
        (**self).supports_run_ids()
    }

    fn exists(&self, run_id: &str) -> Result<bool> {
        (**self).exists(run_id)
    }

    fn location(&self, run_id: Option<&str>) -> String {
        (**self).location(run_id)
    }

    fn write(&self, location: &str, table: &str) -> Result<()> {
        (**self).write(location, table)
    }
}

/// `results.csv` + `Ab12Cd34` -> `results_Ab12Cd34.csv`, next to the base.
pub(crate) fn run_location(base: &Path, run_id: Option<&str>) -> String {
    let Some(run_id) = run_id else {
        return base.display().to_string();
    };

    let stem = base
        .file_stem()
        .map_or_else(|| "results".into(), |s| s.to_string_lossy());
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}_{run_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{run_id}"),
    };

    base.with_file_name(file_name).display().to_string()
}
