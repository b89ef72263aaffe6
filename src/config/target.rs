use super::traits::ConfigSection;
use crate::error::{EcaError, Result};
use crate::syntax::is_identifier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to optimize: a function in a Python file and the arguments to call it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub file: PathBuf,
    pub function: String,
    /// Argument expression for timing runs.
    pub argument: String,
    /// Argument expressions for the correctness baseline.
    pub test_vectors: Vec<String>,
    /// Fixed gating list; replaced by profiling results when profiling is on.
    pub hotspots: Option<Vec<String>>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("target.py"),
            function: "main".to_string(),
            argument: "100000".to_string(),
            test_vectors: vec!["0".to_string(), "1".to_string(), "10".to_string()],
            hotspots: None,
        }
    }
}

impl ConfigSection for TargetConfig {
    fn section_name() -> &'static str {
        "target"
    }

    fn validate(&self) -> Result<()> {
        if !is_identifier(&self.function) {
            return Err(EcaError::Configuration(format!(
                "Function name '{}' is not a valid identifier",
                self.function
            )));
        }
        if self.argument.trim().is_empty() {
            return Err(EcaError::Configuration("Argument expression must not be empty".to_string()));
        }
        if self.test_vectors.iter().any(|v| v.trim().is_empty()) {
            return Err(EcaError::Configuration("Test vectors must not be empty expressions".to_string()));
        }
        if let Some(names) = &self.hotspots {
            if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
                return Err(EcaError::Configuration(format!("Hotspot '{}' is not a valid identifier", bad)));
            }
        }
        Ok(())
    }
}
