//! Experiment configuration
//!
//! Static settings decided before a run starts: the factors, repetition
//! count, optional trial cap, output path, response labels and prompt.
//! Configurations load from JSON:
//!
//! ```json
//! {
//!   "name": "mass-discrimination",
//!   "factors": [
//!     { "kind": "range", "name": "Mass", "lo": 1.0, "hi": 4.0, "levels": 6 }
//!   ],
//!   "repetitions": 5,
//!   "output": "results.csv",
//!   "responses": ["light", "heavy"],
//!   "prompt": "Does the cylinder feel light or heavy?"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::design::{DesignBuilder, Factor};
use crate::presentation::DEFAULT_PROMPT_DELAY;
use crate::session::ResponseScale;
use crate::store::FileStore;
use crate::{Error, Result};

fn default_repetitions() -> usize {
    1
}

fn default_output() -> PathBuf {
    PathBuf::from("results.csv")
}

fn default_responses() -> Vec<String> {
    vec!["0".to_string(), "1".to_string()]
}

#[allow(clippy::cast_possible_truncation)]
fn default_prompt_delay_ms() -> u64 {
    DEFAULT_PROMPT_DELAY.as_millis() as u64
}

/// Settings for one experiment variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Human-readable experiment name
    pub name: String,
    /// Factors in column order
    pub factors: Vec<Factor>,
    /// Times each cell of the cross-product is presented
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    /// Cap on presented trials, sampled uniformly from the full design
    #[serde(default)]
    pub max_trials: Option<usize>,
    /// Result table path
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Give each run its own `<stem>_<RUNID>` file instead of overwriting
    #[serde(default)]
    pub run_ids: bool,
    /// Response labels in category order
    #[serde(default = "default_responses")]
    pub responses: Vec<String>,
    /// Question shown with each trial
    #[serde(default)]
    pub prompt: String,
    /// Delay before the response prompt appears
    #[serde(default = "default_prompt_delay_ms")]
    pub prompt_delay_ms: u64,
}

impl ExperimentConfig {
    /// Single-cylinder mass judgement: 6 masses in `[1, 4]`, 5 repetitions.
    #[must_use]
    pub fn mass_discrimination() -> Self {
        Self {
            name: "mass-discrimination".to_string(),
            factors: vec![Factor::range("Mass", 1.0, 4.0, 6)],
            repetitions: 5,
            max_trials: None,
            output: default_output(),
            run_ids: false,
            responses: vec!["light".to_string(), "heavy".to_string()],
            prompt: "Does the cylinder feel light or heavy?".to_string(),
            prompt_delay_ms: default_prompt_delay_ms(),
        }
    }

    /// Two cylinders, each with a mass in `[1, 3]` and an impact sound.
    #[must_use]
    pub fn paired_mass_audio<I, S>(clips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clips: Vec<String> = clips.into_iter().map(Into::into).collect();
        Self {
            name: "paired-mass-audio".to_string(),
            factors: vec![
                Factor::range("Mass1", 1.0, 3.0, 3),
                Factor::range("Mass2", 1.0, 3.0, 3),
                Factor::discrete("Sound1", clips.clone()),
                Factor::discrete("Sound2", clips),
            ],
            repetitions: 1,
            max_trials: None,
            output: default_output(),
            run_ids: false,
            responses: vec!["first".to_string(), "second".to_string()],
            prompt: "Which cylinder feels heavier?".to_string(),
            prompt_delay_ms: default_prompt_delay_ms(),
        }
    }

    /// [`ExperimentConfig::paired_mass_audio`] limited to `max_trials`.
    #[must_use]
    pub fn paired_mass_audio_capped<I, S>(clips: I, max_trials: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "paired-mass-audio-capped".to_string(),
            max_trials: Some(max_trials),
            ..Self::paired_mass_audio(clips)
        }
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the JSON is malformed or missing fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Design builder for this configuration.
    #[must_use]
    pub fn design(&self) -> DesignBuilder {
        DesignBuilder::new()
            .factors(self.factors.iter().cloned())
            .repetitions(self.repetitions)
            .max_trials(self.max_trials)
    }

    /// Response scale for this configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if fewer than two responses are listed.
    pub fn response_scale(&self) -> Result<ResponseScale> {
        ResponseScale::new(self.responses.iter().cloned())
    }

    /// File store writing to the configured output.
    #[must_use]
    pub fn store(&self) -> FileStore {
        if self.run_ids {
            FileStore::with_run_ids(self.output.clone())
        } else {
            FileStore::new(self.output.clone())
        }
    }

    /// Delay before the response prompt appears.
    #[must_use]
    pub const fn prompt_delay(&self) -> Duration {
        Duration::from_millis(self.prompt_delay_ms)
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::mass_discrimination()
    }
}
