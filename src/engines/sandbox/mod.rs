pub mod driver;
pub mod executor;

pub use driver::Driver;
pub use executor::{ExecutionResult, Sandbox};
