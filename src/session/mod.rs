//! Trial Session - per-trial presentation/response state machine
//!
//! ## State Machine
//!
//! ```text
//! AwaitingResponse(0) ──respond──> AwaitingResponse(1) ──> ... ──> Complete
//! ```
//!
//! Each accepted response is written to its trial's slot exactly once and
//! moves the session forward by one. The response that answers the last
//! trial also writes the result table before `respond` returns.
//!
//! ## Usage
//!
//! ```rust
//! use factorial_trials::design::{DesignBuilder, Factor};
//! use factorial_trials::session::{Progress, ResponseScale, TrialSession};
//! use factorial_trials::store::MemoryStore;
//!
//! let sequence = DesignBuilder::new()
//!     .factor(Factor::range("Mass", 1.0, 4.0, 6))
//!     .build()?;
//!
//! let mut session = TrialSession::new(sequence, MemoryStore::default())?
//!     .with_response_scale(ResponseScale::binary("light", "heavy"));
//!
//! while !session.is_complete() {
//!     let _trial = session.current_trial()?;
//!     if let Progress::Complete { location } = session.respond(0)? {
//!         assert_eq!(location, "results.csv");
//!     }
//! }
//! # Ok::<(), factorial_trials::Error>(())
//! ```

mod response;
mod run_id;

pub use response::ResponseScale;
pub use run_id::{assign_run_id, generate_run_id, MAX_RUN_ID_ATTEMPTS, RUN_ID_LEN};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::design::{Trial, TrialSequence};
use crate::results::ResultTable;
use crate::store::ResultStore;
use crate::{Error, Result};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the response to the trial at this index.
    AwaitingResponse(usize),
    /// Every trial has been answered. Terminal.
    Complete,
}

/// Outcome of an accepted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The session moved on to the trial at `index`.
    Next {
        /// Index of the trial now awaiting a response
        index: usize,
    },
    /// The last trial was answered and the results were written.
    Complete {
        /// Where the result table was written
        location: String,
    },
}

/// One participant's pass through a trial sequence.
pub struct TrialSession<S> {
    sequence: TrialSequence,
    responses: Vec<Option<u32>>,
    current: usize,
    scale: ResponseScale,
    run_id: Option<String>,
    location: String,
    store: S,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl<S: ResultStore> TrialSession<S> {
    /// Start a session over `sequence` that saves to `store`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` for an empty sequence, or
    /// `IdentifierExhausted` if the store supports run identifiers and no
    /// free one was found.
    pub fn new(sequence: TrialSequence, store: S) -> Result<Self> {
        Self::with_rng(sequence, store, &mut rand::thread_rng())
    }

    /// Start a session, drawing the run identifier from `rng`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TrialSession::new`].
    pub fn with_rng<R: Rng + ?Sized>(sequence: TrialSequence, store: S, rng: &mut R) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::InvalidDesign("trial sequence is empty".to_string()));
        }

        let run_id = if store.supports_run_ids() {
            Some(assign_run_id(&store, rng)?)
        } else {
            None
        };
        let location = store.location(run_id.as_deref());

        info!(
            trials = sequence.len(),
            run_id = run_id.as_deref().unwrap_or("-"),
            location = %location,
            "session started"
        );

        Ok(Self {
            responses: vec![None; sequence.len()],
            sequence,
            current: 0,
            scale: ResponseScale::default(),
            run_id,
            location,
            store,
            started_at: Utc::now(),
            completed_at: None,
        })
    }

    /// Replace the response scale. Takes effect for every later response.
    #[must_use]
    pub fn with_response_scale(mut self, scale: ResponseScale) -> Self {
        self.scale = scale;
        self
    }

    /// Get the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.current == self.sequence.len() {
            SessionState::Complete
        } else {
            SessionState::AwaitingResponse(self.current)
        }
    }

    /// Check if every trial has been answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    /// Index of the trial awaiting a response (equals `len()` once complete).
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Number of trials in the session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always false; sessions reject empty sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// `(trial number, total)` of the trial awaiting a response, 1-based.
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.state() {
            SessionState::AwaitingResponse(index) => Some((index + 1, self.len())),
            SessionState::Complete => None,
        }
    }

    /// Get the trial to present now.
    ///
    /// # Errors
    ///
    /// Returns `SessionComplete` once every trial has been answered.
    pub fn current_trial(&self) -> Result<&Trial> {
        self.sequence
            .get(self.current)
            .ok_or(Error::SessionComplete {
                trials: self.sequence.len(),
            })
    }

    /// Record the response to the current trial and advance.
    ///
    /// Answering the last trial writes the result table before returning.
    ///
    /// # Errors
    ///
    /// - `SessionComplete` if every trial has already been answered
    /// - `InvalidResponse` if `value` is not a category of the response
    ///   scale; nothing is recorded and the same trial stays current
    /// - `StorageWriteFailed` if the final write failed; the session is
    ///   still complete and [`TrialSession::save_to`] can retry elsewhere
    pub fn respond(&mut self, value: u32) -> Result<Progress> {
        if self.is_complete() {
            return Err(Error::SessionComplete {
                trials: self.sequence.len(),
            });
        }
        if !self.scale.contains(value) {
            warn!(value, trial = self.current + 1, "response rejected");
            return Err(Error::InvalidResponse {
                value,
                categories: self.scale.len(),
            });
        }

        debug_assert!(self.responses[self.current].is_none());
        self.responses[self.current] = Some(value);
        debug!(
            trial = self.current + 1,
            value,
            label = self.scale.label(value).unwrap_or_default(),
            "response received"
        );
        self.current += 1;

        if self.current < self.sequence.len() {
            return Ok(Progress::Next {
                index: self.current,
            });
        }

        self.completed_at = Some(Utc::now());
        self.save()?;
        Ok(Progress::Complete {
            location: self.location.clone(),
        })
    }

    /// Write the result table to the session's location.
    ///
    /// # Errors
    ///
    /// Returns `StorageWriteFailed` if the store cannot persist the table.
    pub fn save(&self) -> Result<()> {
        self.write_table(&self.location)
    }

    /// Write the result table to another location and adopt it on success.
    ///
    /// # Errors
    ///
    /// Returns `StorageWriteFailed` if the store cannot persist the table.
    pub fn save_to(&mut self, location: impl Into<String>) -> Result<()> {
        let location = location.into();
        self.write_table(&location)?;
        self.location = location;
        Ok(())
    }

    /// Build the result table for the responses recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` only if internal bookkeeping is inconsistent.
    pub fn result_table(&self) -> Result<ResultTable> {
        ResultTable::from_responses(&self.sequence, &self.responses)
    }

    fn write_table(&self, location: &str) -> Result<()> {
        let table = self.result_table()?;
        match self.store.write(location, &table.render()) {
            Ok(()) => {
                info!(location, rows = table.len(), "results saved");
                Ok(())
            }
            Err(e) => {
                error!(location, error = %e, "failed to save results");
                Err(e)
            }
        }
    }

    /// Response records, one per trial; `None` until answered.
    #[must_use]
    pub fn responses(&self) -> &[Option<u32>] {
        &self.responses
    }

    /// Get the trial sequence.
    #[must_use]
    pub const fn sequence(&self) -> &TrialSequence {
        &self.sequence
    }

    /// Get the response scale.
    #[must_use]
    pub const fn response_scale(&self) -> &ResponseScale {
        &self.scale
    }

    /// Run identifier, if the store distinguishes runs.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Where results are (or will be) written.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Get the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// When the session was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the last trial was answered, if it has been.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
