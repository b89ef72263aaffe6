use super::traits::ConfigSection;
use crate::error::{EcaError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter used for every child process.
    pub python: String,
    pub correctness_timeout_secs: f64,
    pub measure_timeout_secs: f64,
    /// Per-run timeout used by the greedy runner.
    pub variant_timeout_secs: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            correctness_timeout_secs: 5.0,
            measure_timeout_secs: 5.0,
            variant_timeout_secs: 10.0,
        }
    }
}

impl SandboxConfig {
    pub fn correctness_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.correctness_timeout_secs)
    }

    pub fn measure_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.measure_timeout_secs)
    }

    pub fn variant_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.variant_timeout_secs)
    }
}

impl ConfigSection for SandboxConfig {
    fn section_name() -> &'static str {
        "sandbox"
    }

    fn validate(&self) -> Result<()> {
        if self.python.trim().is_empty() {
            return Err(EcaError::Configuration("Interpreter path must not be empty".to_string()));
        }
        for (name, secs) in [
            ("Correctness timeout", self.correctness_timeout_secs),
            ("Measure timeout", self.measure_timeout_secs),
            ("Variant timeout", self.variant_timeout_secs),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(EcaError::Configuration(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}
