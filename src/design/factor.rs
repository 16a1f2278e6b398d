//! Factor - one independent experimental dimension

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MAX_DESIGN_SIZE;
use crate::{Error, Result};

/// One experimental dimension and the levels it can take.
///
/// Factors are declared in column order; the declaration order is also the
/// outer-to-inner nesting order of the unshuffled cross-product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Factor {
    /// Evenly spaced magnitudes over `[lo, hi]` (e.g. mass, scale).
    Range {
        /// Column name
        name: String,
        /// First level
        lo: f64,
        /// Last level
        hi: f64,
        /// Number of levels, at least 2
        levels: usize,
    },
    /// Named categories (e.g. audio clip names).
    Discrete {
        /// Column name
        name: String,
        /// One label per level, written to the result table
        labels: Vec<String>,
    },
    /// Unlabelled categories, written to the result table by index.
    Indexed {
        /// Column name
        name: String,
        /// Number of categories
        count: usize,
    },
}

impl Factor {
    /// Create a continuous-range factor.
    #[must_use]
    pub fn range(name: impl Into<String>, lo: f64, hi: f64, levels: usize) -> Self {
        Self::Range {
            name: name.into(),
            lo,
            hi,
            levels,
        }
    }

    /// Create a labelled discrete factor.
    #[must_use]
    pub fn discrete<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Discrete {
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an unlabelled discrete factor with `count` categories.
    #[must_use]
    pub fn indexed(name: impl Into<String>, count: usize) -> Self {
        Self::Indexed {
            name: name.into(),
            count,
        }
    }

    /// Get the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Range { name, .. } | Self::Discrete { name, .. } | Self::Indexed { name, .. } => {
                name
            }
        }
    }

    /// Number of levels this factor contributes to the cross-product.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        match self {
            Self::Range { levels, .. } => *levels,
            Self::Discrete { labels, .. } => labels.len(),
            Self::Indexed { count, .. } => *count,
        }
    }

    /// Check the factor specification without computing levels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` if a range has fewer than 2 levels or a
    /// non-finite span, a discrete factor has no levels, or any factor has
    /// more than [`MAX_DESIGN_SIZE`] levels.
    pub fn validate(&self) -> Result<()> {
        if self.cardinality() > MAX_DESIGN_SIZE {
            return Err(Error::InvalidDesign(format!(
                "factor '{}' has {} levels, exceeds the limit of {MAX_DESIGN_SIZE}",
                self.name(),
                self.cardinality()
            )));
        }

        match self {
            Self::Range { name, lo, hi, levels } => {
                if *levels < 2 {
                    return Err(Error::InvalidDesign(format!(
                        "factor '{name}' needs at least 2 levels, got {levels}"
                    )));
                }
                if !lo.is_finite() || !hi.is_finite() || !(hi - lo).is_finite() {
                    return Err(Error::InvalidDesign(format!(
                        "factor '{name}' has non-finite bounds [{lo}, {hi}]"
                    )));
                }
            }
            Self::Discrete { name, labels } if labels.is_empty() => {
                return Err(Error::InvalidDesign(format!("factor '{name}' has no levels")));
            }
            Self::Indexed { name, count: 0 } => {
                return Err(Error::InvalidDesign(format!("factor '{name}' has no levels")));
            }
            Self::Discrete { .. } | Self::Indexed { .. } => {}
        }
        Ok(())
    }

    /// Compute every level of this factor in ascending order.
    ///
    /// Range levels are `lo + i * (hi - lo) / (levels - 1)`, so the first
    /// level is exactly `lo` and the last is `hi` up to rounding.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Factor::validate`].
    #[allow(clippy::cast_precision_loss)]
    pub fn levels(&self) -> Result<Vec<FactorLevel>> {
        self.validate()?;

        let levels = match self {
            Self::Range { lo, hi, levels, .. } => {
                let step = (hi - lo) / (*levels - 1) as f64;
                (0..*levels)
                    .map(|i| FactorLevel::Magnitude(lo + i as f64 * step))
                    .collect()
            }
            Self::Discrete { labels, .. } => labels
                .iter()
                .enumerate()
                .map(|(index, label)| FactorLevel::Category {
                    index,
                    label: Some(label.clone()),
                })
                .collect(),
            Self::Indexed { count, .. } => (0..*count)
                .map(|index| FactorLevel::Category { index, label: None })
                .collect(),
        };

        Ok(levels)
    }
}

/// One concrete value along one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactorLevel {
    /// Floating-point magnitude from a range factor.
    Magnitude(f64),
    /// Index into a discrete factor, with its label when one exists.
    Category {
        /// Position in the factor's level list
        index: usize,
        /// Human-readable label
        label: Option<String>,
    },
}

impl FactorLevel {
    /// Get the magnitude, if this is a range level.
    #[must_use]
    pub const fn magnitude(&self) -> Option<f64> {
        match self {
            Self::Magnitude(value) => Some(*value),
            Self::Category { .. } => None,
        }
    }

    /// Get the category index, if this is a discrete level.
    #[must_use]
    pub const fn category_index(&self) -> Option<usize> {
        match self {
            Self::Magnitude(_) => None,
            Self::Category { index, .. } => Some(*index),
        }
    }

    /// Get the category label, if this is a labelled discrete level.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Category { label, .. } => label.as_deref(),
            Self::Magnitude(_) => None,
        }
    }
}

/// Renders the value the way it appears in a result table: magnitudes in
/// default decimal form, categories by label or raw index.
impl fmt::Display for FactorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Magnitude(value) => write!(f, "{value}"),
            Self::Category {
                label: Some(label), ..
            } => f.write_str(label),
            Self::Category { index, label: None } => write!(f, "{index}"),
        }
    }
}
