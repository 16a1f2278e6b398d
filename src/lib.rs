//! # factorial-trials: Trial Sequencing for Perceptual Experiments
//!
//! **Version**: 0.1.0
//!
//! factorial-trials drives psychophysics-style experiments: it enumerates
//! every combination of experimental factors, randomizes presentation order,
//! steps a participant through one trial at a time collecting categorical
//! responses, and writes the trial-by-trial record to a CSV table.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Each trial index is answered exactly once; the
//!   session only moves forward
//! - **Jidoka**: Malformed designs stop before the first trial is shown
//! - **Genchi Genbutsu**: Results are on disk before completion is reported
//!
//! ## Example Usage
//!
//! ```rust
//! use factorial_trials::design::{DesignBuilder, Factor};
//! use factorial_trials::session::TrialSession;
//! use factorial_trials::store::MemoryStore;
//!
//! // 6 masses x 5 repetitions = 30 trials in random order
//! let sequence = DesignBuilder::new()
//!     .factor(Factor::range("Mass", 1.0, 4.0, 6))
//!     .repetitions(5)
//!     .build()?;
//!
//! let mut session = TrialSession::new(sequence, MemoryStore::default())?;
//! for _ in 0..30 {
//!     session.respond(0)?;
//! }
//!
//! let table = session.store().get("results.csv").unwrap_or_default();
//! assert_eq!(table.lines().count(), 31);
//! # Ok::<(), factorial_trials::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod design;
pub mod error;
pub mod presentation;
pub mod results;
pub mod session;
pub mod store;

pub use config::ExperimentConfig;
pub use design::{DesignBuilder, Factor, FactorLevel, Trial, TrialSequence};
pub use error::{Error, Result};
pub use presentation::{Clock, ExperimentRunner, PresentationSurface};
pub use results::ResultTable;
pub use session::{Progress, ResponseScale, SessionState, TrialSession};
pub use store::{FileStore, MemoryStore, ResultStore};
