//! Generator configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "seed": 7, "tick_interval_ms": 0, "entropy_formula": "reference" }
//! ```

use crate::cell::EntropyFormula;
use crate::error::ConfigError;
use crate::possibility::BlankPrototypePolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed of the run's random source.
    pub seed: u64,
    /// Milliseconds between two collapse steps when ticking.
    pub tick_interval_ms: u64,
    pub entropy_formula: EntropyFormula,
    pub blank_prototypes: BlankPrototypePolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_interval_ms: 10,
            entropy_formula: EntropyFormula::default(),
            blank_prototypes: BlankPrototypePolicy::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
