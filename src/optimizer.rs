use crate::config::{AppConfig, SearchMode};
use crate::engines::oracles::{CorrectnessOracle, PerformanceOracle};
use crate::engines::profiler::HotspotProfiler;
use crate::engines::sandbox::Sandbox;
use crate::engines::search::{
    build_strategy, generate_variants, GreedyRunner, LogProgress, OracleEvaluator, OracleScorer,
};
use crate::error::{EcaError, Result};
use crate::syntax::SourceProgram;
use crate::transforms::{Capabilities, TransformRegistry};
use crate::types::{HotspotSet, VariantReport};
use serde::Serialize;

/// Result of one optimization run.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub mode: SearchMode,
    /// Single-shot time of the unmodified program.
    pub baseline_time: Option<f64>,
    pub best_source: Option<String>,
    pub best_time: Option<f64>,
    pub variants: Vec<VariantReport>,
    pub hotspots: Option<HotspotSet>,
}

impl OptimizationReport {
    /// Ratio of baseline to best time, when both were measured.
    pub fn speedup(&self) -> Option<f64> {
        match (self.baseline_time, self.best_time) {
            (Some(base), Some(best)) if best > 0.0 => Some(base / best),
            _ => None,
        }
    }
}

/// Wires profiler, oracles, rewriter and search together for one target.
pub struct Optimizer {
    config: AppConfig,
    sandbox: Sandbox,
    capabilities: Option<Capabilities>,
}

impl Optimizer {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let sandbox = Sandbox::from_config(&config.sandbox);
        Ok(Self {
            config,
            sandbox,
            capabilities: None,
        })
    }

    /// Skips interpreter probing and uses the given capabilities instead.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn run(&self) -> Result<OptimizationReport> {
        let target = &self.config.target;
        let text = std::fs::read_to_string(&target.file)?;
        let original = SourceProgram::parse(text)
            .map_err(|e| EcaError::Setup(format!("{} does not parse: {}", target.file.display(), e)))?;

        let correctness = CorrectnessOracle::compute_baseline(
            &self.sandbox,
            original.text(),
            &target.function,
            &target.test_vectors,
            self.config.sandbox.correctness_timeout(),
        )?;

        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Capabilities::detect(&self.sandbox));
        let registry = TransformRegistry::new(&capabilities);
        let hotspots = self.hotspots();

        let mode = self.config.search.mode;
        log::info!("Optimizing {} in {} ({:?} search)", target.function, target.file.display(), mode);

        match mode {
            SearchMode::Greedy => Ok(self.run_greedy(&original, &registry, &correctness, hotspots)),
            SearchMode::Evolutionary | SearchMode::Random => {
                Ok(self.run_search(&original, &registry, &correctness, hotspots))
            }
        }
    }

    /// Profiling results take precedence over a configured list. An empty
    /// profile leaves gating off.
    fn hotspots(&self) -> Option<HotspotSet> {
        let target = &self.config.target;
        let profiler = &self.config.profiler;

        if profiler.enabled {
            let hotspot_profiler = HotspotProfiler::new(&self.sandbox, self.config.sandbox.variant_timeout())
                .with_scratch_dir(profiler.scratch_dir.clone());
            let set = hotspot_profiler.profile(
                &target.file,
                &target.function,
                &target.argument,
                profiler.runs,
                profiler.top_n,
            );
            if set.is_empty() {
                log::warn!("Profiling found no hotspots; transforms are not gated");
                return None;
            }
            for hotspot in set.entries() {
                log::info!(
                    "Hotspot {}: {} calls, {:.6}s cumulative",
                    hotspot.function,
                    hotspot.call_count,
                    hotspot.cumulative_seconds
                );
            }
            return Some(set);
        }

        target.hotspots.as_ref().map(HotspotSet::from_names)
    }

    fn run_greedy(
        &self,
        original: &SourceProgram,
        registry: &TransformRegistry,
        correctness: &CorrectnessOracle,
        hotspots: Option<HotspotSet>,
    ) -> OptimizationReport {
        let target = &self.config.target;
        let performance = PerformanceOracle::new(
            &self.sandbox,
            &target.function,
            &target.argument,
            self.config.sandbox.variant_timeout(),
        );
        let variants = generate_variants(original, &target.function, registry);
        log::info!("Generated {} variants", variants.len());

        let scorer = OracleScorer::new(correctness, &performance);
        let outcome = GreedyRunner::new(&scorer, self.config.search.time_budget()).run(variants);
        if let Some(best) = &outcome.best {
            log::info!("Fastest variant: {}", best.name);
        }

        OptimizationReport {
            mode: SearchMode::Greedy,
            baseline_time: outcome.baseline_time,
            best_source: outcome.best.map(|v| v.program.into_text()),
            best_time: outcome.best_time,
            variants: outcome.reports,
            hotspots,
        }
    }

    fn run_search(
        &self,
        original: &SourceProgram,
        registry: &TransformRegistry,
        correctness: &CorrectnessOracle,
        hotspots: Option<HotspotSet>,
    ) -> OptimizationReport {
        let target = &self.config.target;
        let performance = PerformanceOracle::new(
            &self.sandbox,
            &target.function,
            &target.argument,
            self.config.sandbox.measure_timeout(),
        );

        let baseline = performance.run(original.text());
        let baseline_report = VariantReport {
            name: "original".to_string(),
            elapsed: baseline.elapsed_seconds,
            exit_code: baseline.exit_code,
            passed_correctness: true,
        };

        let mut strategy = build_strategy(&self.config.search);
        let mut evaluator = OracleEvaluator::new(
            original,
            &target.function,
            registry,
            hotspots.as_ref(),
            correctness,
            &performance,
        );
        let outcome = strategy.search(&mut evaluator, &mut LogProgress);
        log::info!(
            "{} search: {} evaluations over {} generations, best genome {:?}",
            strategy.name(),
            outcome.evaluations,
            outcome.generations,
            outcome.best_genome
        );

        OptimizationReport {
            mode: self.config.search.mode,
            baseline_time: baseline.elapsed_seconds,
            best_time: outcome.best_source.as_ref().map(|_| outcome.best_fitness),
            best_source: outcome.best_source,
            variants: vec![baseline_report],
            hotspots,
        }
    }
}
