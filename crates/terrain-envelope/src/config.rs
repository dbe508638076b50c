//! Pipeline configuration.
//!
//! Every stage config is serde-deserializable with defaults for any missing
//! field, so a JSON file only needs to name the values it overrides:
//!
//! ```json
//! { "extract": { "sample_step": 5, "threshold": 50.0 }, "envelope": { "epsilon": 3.0 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::boundary::ExtractConfig;
use crate::envelope::EnvelopeConfig;
use crate::error::{Error, FitError, Result};
use crate::fit::FitConfig;

/// Configuration for a full extract → fit → inflate run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extract: ExtractConfig,
    pub fit: FitConfig,
    pub envelope: EnvelopeConfig,
}

impl PipelineConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&data)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check every stage's values.
    pub fn validate(&self) -> Result<()> {
        self.extract.validate()?;
        if self.fit.max_iters == 0 {
            return Err(Error::InvalidConfig("max_iters must be >= 1".into()));
        }
        if let Some(period) = self.fit.period {
            if !period.is_finite() || period <= 0.0 {
                return Err(FitError::InvalidPeriod(period).into());
            }
        }
        self.envelope.validate()
    }
}
