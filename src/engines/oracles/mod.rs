pub mod correctness;
pub mod performance;

pub use correctness::CorrectnessOracle;
pub use performance::PerformanceOracle;
