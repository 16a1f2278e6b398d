//! Response categories

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Ordered labels of the response categories a participant can give.
///
/// Category `i` is recorded as the integer `i`; labels are only for
/// prompting and for matching typed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseScale {
    labels: Vec<String>,
}

impl ResponseScale {
    /// Create a scale from labels in category order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if fewer than two categories are given.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "a response scale needs at least 2 categories, got {}",
                labels.len()
            )));
        }
        Ok(Self { labels })
    }

    /// Two-category scale: `first` records 0, `second` records 1.
    #[must_use]
    pub fn binary(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            labels: vec![first.into(), second.into()],
        }
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; a scale has at least two categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Check if `value` is a recognized category.
    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        usize::try_from(value).is_ok_and(|v| v < self.labels.len())
    }

    /// Get the label of category `value`.
    #[must_use]
    pub fn label(&self, value: u32) -> Option<&str> {
        usize::try_from(value)
            .ok()
            .and_then(|v| self.labels.get(v))
            .map(String::as_str)
    }

    /// All labels in category order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Match typed input against a category number or label.
    ///
    /// Labels match case-insensitively; surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(&self, input: &str) -> Option<u32> {
        let input = input.trim();
        if let Ok(value) = input.parse::<u32>() {
            return self.contains(value).then_some(value);
        }
        self.labels
            .iter()
            .position(|label| label.eq_ignore_ascii_case(input))
            .and_then(|i| u32::try_from(i).ok())
    }
}

impl Default for ResponseScale {
    fn default() -> Self {
        Self::binary("0", "1")
    }
}
