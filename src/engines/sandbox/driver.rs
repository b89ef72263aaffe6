use std::path::Path;

/// Module name the candidate program is written under.
pub const CANDIDATE_MODULE: &str = "eca_candidate";

pub const RESULT_TAG: &str = "ECA_RESULT";
pub const TIME_TAG: &str = "ECA_TIME";
pub const OUT_TAG: &str = "ECA_OUT";
pub const STAT_TAG: &str = "ECA_STAT";

/// The Python script launched next to a candidate.
///
/// Every tagged line is `TAG <json>` so values with spaces or newlines in
/// their repr survive the trip.
#[derive(Debug, Clone)]
pub enum Driver<'a> {
    /// Times one call of `entry_fn(arg)`.
    Timed { entry_fn: &'a str, arg: &'a str },
    /// Prints the repr of `entry_fn(v)` for each vector, in order.
    Outputs { entry_fn: &'a str, vectors: &'a [String] },
    /// Loads a file by path and profiles one call, dumping pstats data.
    Profile {
        target: &'a Path,
        entry_fn: &'a str,
        arg: &'a str,
        stats_path: &'a Path,
    },
    /// Reads a pstats dump and prints one record per function.
    ProfileReport { stats_path: &'a Path },
    /// Imports a module and exits.
    Import { module: &'a str },
}

impl Driver<'_> {
    /// The function the driver calls, if any.
    pub fn entry_fn(&self) -> Option<&str> {
        match self {
            Driver::Timed { entry_fn, .. }
            | Driver::Outputs { entry_fn, .. }
            | Driver::Profile { entry_fn, .. } => Some(*entry_fn),
            Driver::ProfileReport { .. } | Driver::Import { .. } => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Driver::Timed { entry_fn, arg } => format!(
                "import json\n\
                 import time\n\
                 from {module} import {entry_fn}\n\
                 \n\
                 _start = time.perf_counter()\n\
                 _result = {entry_fn}({arg})\n\
                 _elapsed = time.perf_counter() - _start\n\
                 print(\"{RESULT_TAG}\", json.dumps(repr(_result)))\n\
                 print(\"{TIME_TAG}\", json.dumps(_elapsed))\n",
                module = CANDIDATE_MODULE,
            ),
            Driver::Outputs { entry_fn, vectors } => {
                let mut script = format!("import json\nfrom {CANDIDATE_MODULE} import {entry_fn}\n\n");
                for vector in vectors.iter() {
                    script.push_str(&format!(
                        "print(\"{OUT_TAG}\", json.dumps(repr({entry_fn}({vector}))))\n"
                    ));
                }
                script
            }
            Driver::Profile { target, entry_fn, arg, stats_path } => format!(
                "import cProfile\n\
                 import importlib.util\n\
                 \n\
                 _spec = importlib.util.spec_from_file_location(\"eca_target\", {target})\n\
                 _module = importlib.util.module_from_spec(_spec)\n\
                 _spec.loader.exec_module(_module)\n\
                 _profiler = cProfile.Profile()\n\
                 _profiler.enable()\n\
                 _module.{entry_fn}({arg})\n\
                 _profiler.disable()\n\
                 _profiler.dump_stats({stats})\n",
                target = python_str(target),
                stats = python_str(stats_path),
            ),
            Driver::ProfileReport { stats_path } => format!(
                "import json\n\
                 import pstats\n\
                 \n\
                 _stats = pstats.Stats({stats})\n\
                 for (_file, _line, _name), (_cc, _nc, _tt, _ct, _callers) in _stats.stats.items():\n    \
                     print(\"{STAT_TAG}\", json.dumps([_file, _line, _name, _nc, _ct]))\n",
                stats = python_str(stats_path),
            ),
            Driver::Import { module } => format!("import {module}\n"),
        }
    }
}

/// A JSON string literal is also a valid Python string literal.
fn python_str(path: &Path) -> String {
    serde_json::to_string(&path.to_string_lossy()).unwrap_or_else(|_| "''".to_string())
}
