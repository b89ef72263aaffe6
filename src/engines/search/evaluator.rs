use crate::engines::oracles::{CorrectnessOracle, PerformanceOracle};
use crate::syntax::SourceProgram;
use crate::transforms::TransformRegistry;
use crate::types::{HotspotSet, REJECTED};

/// Scored candidate produced from one genome.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub source: String,
    pub fitness: f64,
}

/// Turns a genome into a fitness value. Lower is better.
pub trait Evaluator {
    /// Number of distinct gene values (the size of the rule set).
    fn gene_count(&self) -> usize;

    fn evaluate(&mut self, genome: &[usize]) -> Evaluation;
}

/// Materializes genomes through the transform registry and scores them
/// with the correctness and performance oracles.
pub struct OracleEvaluator<'a> {
    original: &'a SourceProgram,
    entry_fn: &'a str,
    registry: &'a TransformRegistry,
    hotspots: Option<&'a HotspotSet>,
    correctness: &'a CorrectnessOracle,
    performance: &'a PerformanceOracle,
}

impl<'a> OracleEvaluator<'a> {
    pub fn new(
        original: &'a SourceProgram,
        entry_fn: &'a str,
        registry: &'a TransformRegistry,
        hotspots: Option<&'a HotspotSet>,
        correctness: &'a CorrectnessOracle,
        performance: &'a PerformanceOracle,
    ) -> Self {
        Self {
            original,
            entry_fn,
            registry,
            hotspots,
            correctness,
            performance,
        }
    }
}

impl Evaluator for OracleEvaluator<'_> {
    fn gene_count(&self) -> usize {
        self.registry.len()
    }

    fn evaluate(&mut self, genome: &[usize]) -> Evaluation {
        let candidate = self
            .registry
            .materialize(self.original, self.entry_fn, genome, self.hotspots);

        let fitness = if !self.correctness.check(candidate.text()) {
            log::debug!("{:?} rejected: output differs from baseline", genome);
            REJECTED
        } else {
            match self.performance.measure(candidate.text()) {
                Some(seconds) => seconds,
                None => {
                    log::debug!("{:?} rejected: no timing", genome);
                    REJECTED
                }
            }
        };

        Evaluation {
            source: candidate.into_text(),
            fitness,
        }
    }
}
