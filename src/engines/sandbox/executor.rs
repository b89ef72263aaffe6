use super::driver::{Driver, CANDIDATE_MODULE, TIME_TAG};
use crate::config::SandboxConfig;
use crate::error::{EcaError, Result};
use crate::syntax::is_identifier;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Outcome of one sandboxed run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// `None` when the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
    /// Time reported by the driver; `None` on timeout, crash, or a missing tag.
    pub elapsed_seconds: Option<f64>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub wall_time: Duration,
}

impl ExecutionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stderr: message.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Payloads of the stdout lines starting with `tag`.
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.stdout.lines().filter_map(move |line| {
            line.strip_prefix(tag)
                .and_then(|rest| rest.strip_prefix(' '))
        })
    }

    /// Decodes every `tag` payload as JSON; `None` if any line is malformed.
    pub fn tagged_json<T: DeserializeOwned>(&self, tag: &str) -> Option<Vec<T>> {
        self.tagged(tag)
            .map(|payload| serde_json::from_str(payload).ok())
            .collect()
    }

    /// Short excerpt of stderr for log lines.
    pub fn stderr_tail(&self) -> &str {
        let trimmed = self.stderr.trim_end();
        match trimmed.char_indices().rev().nth(400) {
            Some((at, _)) => &trimmed[at..],
            None => trimmed,
        }
    }
}

/// Runs program fragments in a fresh interpreter process each time.
///
/// Every call gets its own temporary directory holding the candidate module,
/// the driver script, and the captured output, so no caches or imported
/// state carry over between runs. The directory is removed afterwards.
#[derive(Debug, Clone)]
pub struct Sandbox {
    python: String,
}

impl Sandbox {
    pub fn new(python: impl Into<String>) -> Self {
        Self { python: python.into() }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(config.python.clone())
    }

    /// Times `entry_fn(arg)` in `program`.
    pub fn run(&self, program: &str, entry_fn: &str, arg: &str, timeout: Duration) -> Result<ExecutionResult> {
        self.execute(program, &Driver::Timed { entry_fn, arg }, timeout)
    }

    pub fn execute(&self, program: &str, driver: &Driver<'_>, timeout: Duration) -> Result<ExecutionResult> {
        if let Some(entry_fn) = driver.entry_fn().filter(|name| !is_identifier(name)) {
            return Err(EcaError::Configuration(format!(
                "'{}' is not a valid function name",
                entry_fn
            )));
        }
        let dir = tempfile::Builder::new().prefix("eca_run_").tempdir()?;
        let result = self.execute_in(dir.path(), program, driver, timeout);
        if let Err(e) = dir.close() {
            log::debug!("Failed to clean up sandbox directory: {}", e);
        }
        result
    }

    fn execute_in(&self, dir: &Path, program: &str, driver: &Driver<'_>, timeout: Duration) -> Result<ExecutionResult> {
        fs::write(dir.join(format!("{}.py", CANDIDATE_MODULE)), program)?;
        let driver_path = dir.join("eca_driver.py");
        fs::write(&driver_path, driver.render())?;

        let stdout_path = dir.join("stdout.txt");
        let stderr_path = dir.join("stderr.txt");
        let stdout_file = File::create(&stdout_path)?;
        let stderr_file = File::create(&stderr_path)?;

        let start = Instant::now();
        let mut child = Command::new(&self.python)
            .arg("-B")
            .arg(&driver_path)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(|e| EcaError::Sandbox(format!("failed to launch '{}': {}", self.python, e)))?;

        let (status, timed_out) = wait_with_timeout(&mut child, timeout)?;
        let wall_time = start.elapsed();

        let mut result = ExecutionResult {
            exit_code: if timed_out { None } else { status.code() },
            elapsed_seconds: None,
            stdout: read_lossy(&stdout_path),
            stderr: read_lossy(&stderr_path),
            timed_out,
            wall_time,
        };
        if timed_out {
            log::debug!("Sandbox run killed after {:?}", timeout);
            result
                .stderr
                .push_str(&format!("\ntimeout: killed after {:.3}s", timeout.as_secs_f64()));
        }
        if result.succeeded() {
            result.elapsed_seconds = result
                .tagged_json::<f64>(TIME_TAG)
                .and_then(|times| times.last().copied())
                .filter(|t| t.is_finite() && *t >= 0.0);
        }
        Ok(result)
    }
}

fn read_lossy(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Polls the child until it exits, killing it once `timeout` has passed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            let _ = child.kill();
            let status = child.wait()?;
            return Ok((status, true));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_stdout(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            ..ExecutionResult::default()
        }
    }

    #[test]
    fn test_tagged_lines() {
        let result = with_stdout("noise\nECA_OUT \"1\"\nECA_OUTX \"2\"\nECA_OUT \"3\"\n");
        let outs: Vec<&str> = result.tagged("ECA_OUT").collect();
        assert_eq!(outs, vec!["\"1\"", "\"3\""]);
        let decoded: Vec<String> = result.tagged_json("ECA_OUT").unwrap();
        assert_eq!(decoded, vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_malformed_json_rejects_all() {
        let result = with_stdout("ECA_OUT \"1\"\nECA_OUT not-json\n");
        assert!(result.tagged_json::<String>("ECA_OUT").is_none());
    }

    #[test]
    fn test_success_requires_clean_exit() {
        assert!(with_stdout("").succeeded());
        let crashed = ExecutionResult { exit_code: Some(1), ..ExecutionResult::default() };
        assert!(!crashed.succeeded());
        let killed = ExecutionResult { timed_out: true, ..ExecutionResult::default() };
        assert!(!killed.succeeded());
    }

    #[test]
    fn test_missing_interpreter_is_an_error() {
        let sandbox = Sandbox::new("definitely-not-a-python-interpreter");
        let err = sandbox.run("", "f", "1", Duration::from_secs(1));
        assert!(matches!(err, Err(EcaError::Sandbox(_))));
    }

    #[test]
    fn test_invalid_entry_is_rejected_before_launch() {
        let sandbox = Sandbox::new("definitely-not-a-python-interpreter");
        let err = sandbox.run("", "f(); import os", "1", Duration::from_secs(1));
        assert!(matches!(err, Err(EcaError::Configuration(_))));
    }
}
