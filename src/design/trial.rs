//! Trial - one combination of factor levels

use std::fmt;

use serde::{Deserialize, Serialize};

use super::FactorLevel;

/// An ordered tuple of factor levels, one per declared factor.
///
/// Trials are produced once by the design builder and never mutated.
/// Only their position in a [`TrialSequence`](super::TrialSequence) identifies
/// them; two cells with identical levels are legitimately indistinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    levels: Vec<FactorLevel>,
}

impl Trial {
    /// Create a trial from levels in declared factor order.
    #[must_use]
    pub fn new(levels: Vec<FactorLevel>) -> Self {
        Self { levels }
    }

    /// Get all levels in declared factor order.
    #[must_use]
    pub fn levels(&self) -> &[FactorLevel] {
        &self.levels
    }

    /// Get the level of the factor at `column`.
    #[must_use]
    pub fn level(&self, column: usize) -> Option<&FactorLevel> {
        self.levels.get(column)
    }

    /// Get the magnitude of the factor at `column`, if it is a range factor.
    #[must_use]
    pub fn magnitude(&self, column: usize) -> Option<f64> {
        self.level(column).and_then(FactorLevel::magnitude)
    }

    /// Number of factors in this trial.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.levels.len()
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{level}")?;
        }
        f.write_str(")")
    }
}
