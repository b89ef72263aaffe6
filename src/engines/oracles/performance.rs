use crate::engines::sandbox::{ExecutionResult, Sandbox};
use std::time::Duration;

/// Single-shot timing of the designated call. No warm-up, no retries.
#[derive(Clone)]
pub struct PerformanceOracle {
    sandbox: Sandbox,
    entry_fn: String,
    arg: String,
    timeout: Duration,
}

impl PerformanceOracle {
    pub fn new(sandbox: &Sandbox, entry_fn: &str, arg: &str, timeout: Duration) -> Self {
        Self {
            sandbox: sandbox.clone(),
            entry_fn: entry_fn.to_string(),
            arg: arg.to_string(),
            timeout,
        }
    }

    /// Seconds taken by one call, or `None` on any failure or timeout.
    pub fn measure(&self, candidate: &str) -> Option<f64> {
        self.run(candidate).elapsed_seconds
    }

    /// The full sandbox result of a timing run, for diagnostics.
    pub fn run(&self, candidate: &str) -> ExecutionResult {
        match self.sandbox.run(candidate, &self.entry_fn, &self.arg, self.timeout) {
            Ok(result) => {
                if result.elapsed_seconds.is_none() {
                    log::debug!(
                        "Timing run produced no measurement (exit {:?}, timed out: {}): {}",
                        result.exit_code,
                        result.timed_out,
                        result.stderr_tail()
                    );
                }
                result
            }
            Err(e) => {
                log::warn!("Timing run could not start: {}", e);
                ExecutionResult::failed(e.to_string())
            }
        }
    }
}
