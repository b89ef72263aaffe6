use serde::{Deserialize, Serialize};

/// Fitness of a candidate that failed correctness, did not apply, or timed out.
pub const REJECTED: f64 = f64::INFINITY;

/// A function found to dominate the cost of the profiled call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub function: String,
    pub call_count: u64,
    pub cumulative_seconds: f64,
}

impl Hotspot {
    pub fn named(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            call_count: 0,
            cumulative_seconds: 0.0,
        }
    }
}

/// Ordered hotspot list used to gate which rules may fire. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotSet {
    entries: Vec<Hotspot>,
}

impl HotspotSet {
    pub fn new(entries: Vec<Hotspot>) -> Self {
        Self { entries }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Hotspot::named).collect())
    }

    pub fn contains(&self, function: &str) -> bool {
        self.entries.iter().any(|h| h.function == function)
    }

    pub fn entries(&self) -> &[Hotspot] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Diagnostic record for one tested variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub name: String,
    pub elapsed: Option<f64>,
    pub exit_code: Option<i32>,
    pub passed_correctness: bool,
}
