pub mod config;
pub mod engines;
pub mod error;
pub mod optimizer;
pub mod syntax;
pub mod transforms;
pub mod types;

pub use error::{EcaError, Result};
pub use optimizer::{OptimizationReport, Optimizer};
