use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcaError {
    #[error("Setup failure: {0}")]
    Setup(String),

    #[error("Parse failure at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Apply failure: {0}")]
    Apply(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EcaError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        EcaError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EcaError>;
