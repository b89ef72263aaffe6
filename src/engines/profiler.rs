use crate::engines::sandbox::driver::STAT_TAG;
use crate::engines::sandbox::{Driver, Sandbox};
use crate::types::{Hotspot, HotspotSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One row of a pstats dump: `(file, line, function, ncalls, cumtime)`.
type StatRecord = (String, u64, String, u64, f64);

/// Finds the functions that dominate one call of the entry function.
pub struct HotspotProfiler {
    sandbox: Sandbox,
    timeout: Duration,
    scratch_dir: Option<PathBuf>,
}

impl HotspotProfiler {
    pub fn new(sandbox: &Sandbox, timeout: Duration) -> Self {
        Self {
            sandbox: sandbox.clone(),
            timeout,
            scratch_dir: None,
        }
    }

    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Profiles `entry_fn(arg)` from `target_file` up to `runs` times and
    /// reads back the last successful run.
    ///
    /// Profiling is advisory: failed runs are skipped, and without scratch
    /// space or a successful run the set is empty.
    pub fn profile(&self, target_file: &Path, entry_fn: &str, arg: &str, runs: usize, top_n: usize) -> HotspotSet {
        let mut builder = tempfile::Builder::new();
        builder.prefix("eca_profile_");
        let scratch = match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        };
        let scratch = match scratch {
            Ok(scratch) => scratch,
            Err(e) => {
                log::warn!("Cannot create profiling scratch space, skipping profile: {}", e);
                return HotspotSet::default();
            }
        };
        let target = target_file
            .canonicalize()
            .unwrap_or_else(|_| target_file.to_path_buf());

        let mut last_ok: Option<PathBuf> = None;
        for run in 0..runs {
            let stats_path = scratch.path().join(format!("run_{}.prof", run));
            let driver = Driver::Profile {
                target: &target,
                entry_fn,
                arg,
                stats_path: &stats_path,
            };
            match self.sandbox.execute("", &driver, self.timeout) {
                Ok(result) if result.succeeded() && stats_path.exists() => last_ok = Some(stats_path),
                Ok(result) => log::debug!(
                    "Profiling run {} failed (exit {:?}): {}",
                    run + 1,
                    result.exit_code,
                    result.stderr_tail()
                ),
                Err(e) => log::debug!("Profiling run {} could not start: {}", run + 1, e),
            }
        }

        let Some(stats_path) = last_ok else {
            log::warn!("No successful profiling run for {}", entry_fn);
            return HotspotSet::default();
        };

        let records = self.read_stats(&stats_path);
        rank_hotspots(records, &target, entry_fn, top_n)
    }

    fn read_stats(&self, stats_path: &Path) -> Vec<StatRecord> {
        let driver = Driver::ProfileReport { stats_path };
        match self.sandbox.execute("", &driver, self.timeout) {
            Ok(result) if result.succeeded() => result.tagged_json(STAT_TAG).unwrap_or_else(|| {
                log::warn!("Malformed profile report");
                Vec::new()
            }),
            Ok(result) => {
                log::warn!("Profile report failed: {}", result.stderr_tail());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Profile report could not start: {}", e);
                Vec::new()
            }
        }
    }
}

/// Keeps functions defined in the target file or named `entry_fn`, ordered
/// by descending cumulative time.
fn rank_hotspots(records: Vec<StatRecord>, target: &Path, entry_fn: &str, top_n: usize) -> HotspotSet {
    let target_name = target.file_name().map(|n| n.to_string_lossy().into_owned());

    let mut hotspots: Vec<Hotspot> = records
        .into_iter()
        .filter(|(file, _, name, _, _)| {
            let in_target = target_name
                .as_deref()
                .is_some_and(|t| Path::new(file).file_name().is_some_and(|f| f.to_string_lossy() == t));
            in_target || name == entry_fn
        })
        .map(|(_, _, function, call_count, cumulative_seconds)| Hotspot {
            function,
            call_count,
            cumulative_seconds,
        })
        .collect();

    hotspots.sort_by(|a, b| b.cumulative_seconds.total_cmp(&a.cumulative_seconds));
    hotspots.truncate(top_n);
    HotspotSet::new(hotspots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &str, name: &str, cumtime: f64) -> StatRecord {
        (file.to_string(), 1, name.to_string(), 1, cumtime)
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let records = vec![
            record("/work/target.py", "helper", 0.2),
            record("/usr/lib/python3/json/encoder.py", "encode", 5.0),
            record("/work/target.py", "<module>", 0.1),
            record("~", "main", 0.9),
            record("/work/target.py", "inner", 0.5),
        ];
        let set = rank_hotspots(records, Path::new("/tmp/x/target.py"), "main", 3);
        let names: Vec<&str> = set.entries().iter().map(|h| h.function.as_str()).collect();
        assert_eq!(names, vec!["main", "inner", "helper"]);
    }

    #[test]
    fn test_missing_scratch_dir_gives_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let profiler = HotspotProfiler::new(&Sandbox::new("python3"), Duration::from_secs(5))
            .with_scratch_dir(Some(dir.path().join("absent")));
        let set = profiler.profile(Path::new("target.py"), "main", "1", 2, 3);
        assert!(set.is_empty());
    }

    #[test]
    fn test_rank_empty() {
        let set = rank_hotspots(Vec::new(), Path::new("target.py"), "main", 3);
        assert!(set.is_empty());
    }
}
