use super::traits::ConfigSection;
use crate::error::{EcaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub enabled: bool,
    pub runs: usize,
    pub top_n: usize,
    /// Parent of the per-run scratch directory; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            runs: 3,
            top_n: 3,
            scratch_dir: None,
        }
    }
}

impl ConfigSection for ProfilerConfig {
    fn section_name() -> &'static str {
        "profiler"
    }

    fn validate(&self) -> Result<()> {
        if self.enabled && (self.runs == 0 || self.top_n == 0) {
            return Err(EcaError::Configuration(
                "Profiler runs and top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
