use crate::engines::sandbox::driver::OUT_TAG;
use crate::engines::sandbox::{Driver, ExecutionResult, Sandbox};
use crate::error::{EcaError, Result};
use std::time::Duration;

/// Compares a candidate's outputs against those recorded from the original.
pub struct CorrectnessOracle {
    sandbox: Sandbox,
    entry_fn: String,
    vectors: Vec<String>,
    baseline: Vec<String>,
    timeout: Duration,
}

impl CorrectnessOracle {
    /// Records the original's repr for each test vector, in order.
    ///
    /// This is the one failure that aborts a run: without a baseline there
    /// is nothing to compare candidates against.
    pub fn compute_baseline(
        sandbox: &Sandbox,
        program: &str,
        entry_fn: &str,
        vectors: &[String],
        timeout: Duration,
    ) -> Result<Self> {
        let result = sandbox
            .execute(program, &Driver::Outputs { entry_fn, vectors }, timeout)
            .map_err(|e| EcaError::Setup(format!("baseline could not be executed: {}", e)))?;

        let baseline = collect_outputs(&result, vectors.len()).ok_or_else(|| {
            EcaError::Setup(format!(
                "baseline run failed (exit {:?}, timed out: {}): {}",
                result.exit_code,
                result.timed_out,
                result.stderr_tail()
            ))
        })?;
        log::info!("Recorded baseline for {} over {} vectors", entry_fn, vectors.len());

        Ok(Self {
            sandbox: sandbox.clone(),
            entry_fn: entry_fn.to_string(),
            vectors: vectors.to_vec(),
            baseline,
            timeout,
        })
    }

    pub fn baseline(&self) -> &[String] {
        &self.baseline
    }

    /// True iff the candidate runs cleanly and reproduces the baseline
    /// element for element. Never fails.
    pub fn check(&self, candidate: &str) -> bool {
        let driver = Driver::Outputs {
            entry_fn: &self.entry_fn,
            vectors: &self.vectors,
        };
        let result = match self.sandbox.execute(candidate, &driver, self.timeout) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Correctness run could not start: {}", e);
                return false;
            }
        };
        match collect_outputs(&result, self.vectors.len()) {
            Some(outputs) if outputs == self.baseline => true,
            Some(outputs) => {
                log::debug!("Output mismatch: expected {:?}, got {:?}", self.baseline, outputs);
                false
            }
            None => {
                log::debug!(
                    "Correctness run failed (exit {:?}, timed out: {}): {}",
                    result.exit_code,
                    result.timed_out,
                    result.stderr_tail()
                );
                false
            }
        }
    }
}

fn collect_outputs(result: &ExecutionResult, expected: usize) -> Option<Vec<String>> {
    if !result.succeeded() {
        return None;
    }
    result
        .tagged_json::<String>(OUT_TAG)
        .filter(|outputs| outputs.len() == expected)
}
