//! Error types for factorial-trials
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// factorial-trials error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed factor specification (fatal at construction)
    #[error("Invalid design: {0}\nNo trials were presented. Fix the factor specification and restart.")]
    InvalidDesign(String),

    /// Response category outside the recognized set (re-prompt the participant)
    #[error("Invalid response {value}: expected a category in 0..{categories}")]
    InvalidResponse {
        /// Rejected response value
        value: u32,
        /// Number of recognized categories
        categories: usize,
    },

    /// Operation attempted after the last trial was answered
    #[error("Session complete: all {trials} trials have already been answered")]
    SessionComplete {
        /// Length of the trial sequence
        trials: usize,
    },

    /// Every generated run identifier already existed in the store
    #[error("Run identifier exhausted: {attempts} candidate identifiers all collided\nClear old results from the store and retry.")]
    IdentifierExhausted {
        /// Number of identifiers tried
        attempts: usize,
    },

    /// Result table could not be persisted
    #[error("Failed to write results to '{location}': {source}")]
    StorageWriteFailed {
        /// Destination that could not be written
        location: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Experiment configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Result table could not be parsed
    #[error("Result table parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
