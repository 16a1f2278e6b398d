//! Design Builder - factorial trial construction and randomization
//!
//! Builds the full cross-product of an ordered list of factors, repeats each
//! cell, shuffles the result into presentation order and optionally keeps
//! only a prefix of it.
//!
//! ## Usage
//!
//! ```rust
//! use factorial_trials::design::{DesignBuilder, Factor};
//!
//! let sequence = DesignBuilder::new()
//!     .factor(Factor::range("Mass", 1.0, 4.0, 6))
//!     .repetitions(5)
//!     .build()?;
//!
//! assert_eq!(sequence.len(), 30);
//! # Ok::<(), factorial_trials::Error>(())
//! ```

mod factor;
mod shuffle;
mod trial;

pub use factor::{Factor, FactorLevel};
pub use shuffle::shuffle;
pub use trial::Trial;

use rand::Rng;
use tracing::info;

use crate::{Error, Result};

/// Upper bound on the full cross-product, repetitions included.
pub const MAX_DESIGN_SIZE: usize = 1 << 24;

/// Trials in randomized presentation order, plus the column names they
/// are serialized under.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSequence {
    columns: Vec<String>,
    trials: Vec<Trial>,
    design_size: usize,
}

impl TrialSequence {
    /// Wrap an already-ordered list of trials.
    ///
    /// Used when the presentation order is decided elsewhere (a replayed or
    /// hand-built schedule). The order is kept as given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` if `trials` is empty or any trial's arity
    /// differs from the number of columns.
    pub fn from_trials(columns: Vec<String>, trials: Vec<Trial>) -> Result<Self> {
        if trials.is_empty() {
            return Err(Error::InvalidDesign("trial sequence is empty".to_string()));
        }
        if let Some((i, trial)) = trials
            .iter()
            .enumerate()
            .find(|(_, t)| t.arity() != columns.len())
        {
            return Err(Error::InvalidDesign(format!(
                "trial {} has {} levels but the design has {} columns",
                i + 1,
                trial.arity(),
                columns.len()
            )));
        }

        let design_size = trials.len();
        Ok(Self {
            columns,
            trials,
            design_size,
        })
    }

    /// Factor column names in declared order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of trials that will be presented.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Check if the sequence is empty. Never true for built sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Size of the full design before any trial cap was applied.
    #[must_use]
    pub const fn design_size(&self) -> usize {
        self.design_size
    }

    /// Get the trial at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Trial> {
        self.trials.get(index)
    }

    /// All trials in presentation order.
    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Iterate over trials in presentation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }
}

impl<'a> IntoIterator for &'a TrialSequence {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}

/// Builder for a randomized factorial [`TrialSequence`].
#[derive(Debug, Clone)]
pub struct DesignBuilder {
    factors: Vec<Factor>,
    repetitions: usize,
    max_trials: Option<usize>,
}

impl Default for DesignBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignBuilder {
    /// Create a builder with no factors and one repetition.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            factors: Vec::new(),
            repetitions: 1,
            max_trials: None,
        }
    }

    /// Append a factor. Declaration order sets column order.
    #[must_use]
    pub fn factor(mut self, factor: Factor) -> Self {
        self.factors.push(factor);
        self
    }

    /// Append several factors in order.
    #[must_use]
    pub fn factors(mut self, factors: impl IntoIterator<Item = Factor>) -> Self {
        self.factors.extend(factors);
        self
    }

    /// Set how many times each cell of the cross-product appears.
    #[must_use]
    pub const fn repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Cap the number of presented trials.
    ///
    /// A cap at or above the design size has no effect.
    #[must_use]
    pub const fn max_trials(mut self, max_trials: Option<usize>) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Get the declared factors.
    #[must_use]
    pub fn declared_factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Size of the full design: `repetitions * product(cardinalities)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` for any malformed factor, zero repetitions,
    /// a zero cap, an empty factor list, or a size above [`MAX_DESIGN_SIZE`].
    pub fn design_size(&self) -> Result<usize> {
        if self.factors.is_empty() {
            return Err(Error::InvalidDesign("no factors declared".to_string()));
        }
        if self.repetitions < 1 {
            return Err(Error::InvalidDesign(
                "repetitions must be at least 1".to_string(),
            ));
        }
        if self.max_trials == Some(0) {
            return Err(Error::InvalidDesign(
                "max_trials must be at least 1 when set".to_string(),
            ));
        }

        let mut size = self.repetitions;
        for factor in &self.factors {
            factor.validate()?;
            size = size
                .checked_mul(factor.cardinality())
                .filter(|&size| size <= MAX_DESIGN_SIZE)
                .ok_or_else(|| {
                    Error::InvalidDesign(format!(
                        "design size exceeds the limit of {MAX_DESIGN_SIZE} trials"
                    ))
                })?;
        }

        Ok(size)
    }

    /// Number of trials a built sequence will contain.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DesignBuilder::design_size`].
    pub fn trial_count(&self) -> Result<usize> {
        let size = self.design_size()?;
        Ok(self.max_trials.map_or(size, |cap| cap.min(size)))
    }

    /// Build the unshuffled cross-product.
    ///
    /// Factors nest outer-to-inner in declared order and repetitions are the
    /// innermost loop, so each cell appears `repetitions` times in a row.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DesignBuilder::design_size`].
    pub fn cross_product(&self) -> Result<Vec<Trial>> {
        let size = self.design_size()?;
        let levels = self
            .factors
            .iter()
            .map(Factor::levels)
            .collect::<Result<Vec<_>>>()?;

        let mut trials = Vec::with_capacity(size);
        let mut odometer = vec![0usize; levels.len()];

        'cells: loop {
            let trial = Trial::new(
                odometer
                    .iter()
                    .zip(&levels)
                    .map(|(&i, column)| column[i].clone())
                    .collect(),
            );
            for _ in 1..self.repetitions {
                trials.push(trial.clone());
            }
            trials.push(trial);

            // Advance the innermost factor, carrying outward.
            let mut column = levels.len();
            loop {
                if column == 0 {
                    break 'cells;
                }
                column -= 1;
                odometer[column] += 1;
                if odometer[column] < levels[column].len() {
                    break;
                }
                odometer[column] = 0;
            }
        }

        debug_assert_eq!(trials.len(), size);
        Ok(trials)
    }

    /// Build a randomized sequence using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` if the factor specification is malformed.
    pub fn build(&self) -> Result<TrialSequence> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    /// Build a randomized sequence using the given RNG.
    ///
    /// The full cross-product is shuffled and then truncated to the cap, so
    /// a capped sequence is a uniform sample without replacement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` if the factor specification is malformed.
    pub fn build_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialSequence> {
        let mut trials = self.cross_product()?;
        let design_size = trials.len();

        shuffle(&mut trials, rng);

        if let Some(cap) = self.max_trials {
            trials.truncate(cap);
        }

        info!(
            "{} variations, using {} of them",
            design_size,
            trials.len()
        );

        Ok(TrialSequence {
            columns: self.factors.iter().map(|f| f.name().to_string()).collect(),
            trials,
            design_size,
        })
    }
}
