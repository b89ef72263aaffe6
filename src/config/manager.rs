use super::{
    profiler::ProfilerConfig, sandbox::SandboxConfig, search::SearchConfig, target::TargetConfig,
    traits::ConfigSection,
};
use crate::error::{EcaError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `ECA__SEARCH__MODE=evolutionary`.
const ENV_PREFIX: &str = "ECA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub search: SearchConfig,
    pub sandbox: SandboxConfig,
    pub profiler: ProfilerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        validate_section(&self.target)?;
        validate_section(&self.search)?;
        validate_section(&self.sandbox)?;
        validate_section(&self.profiler)?;
        Ok(())
    }
}

/// Validates one section, naming it in any configuration error.
fn validate_section<S: ConfigSection>(section: &S) -> Result<()> {
    section.validate().map_err(|e| match e {
        EcaError::Configuration(msg) => EcaError::Configuration(format!("[{}] {}", S::section_name(), msg)),
        other => other,
    })
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Loads a TOML file, then applies `ECA__SECTION__KEY` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EcaError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let source = File::from(path).format(FileFormat::Toml);
        self.load(Config::builder().add_source(source))
    }

    /// Same as [`load_from_file`](Self::load_from_file) for in-memory TOML.
    pub fn load_from_str(&self, contents: &str) -> Result<()> {
        self.load(Config::builder().add_source(File::from_str(contents, FileFormat::Toml)))
    }

    fn load(&self, builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<()> {
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        *self.write()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| EcaError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| EcaError::Configuration("Config lock poisoned".to_string()))
    }

    /// Applies `f` and keeps the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write()?;
        let mut updated = config.clone();
        f(&mut updated);
        updated.validate()?;
        *config = updated;
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>> {
        self.config
            .write()
            .map_err(|_| EcaError::Configuration("Config lock poisoned".to_string()))
    }
}
