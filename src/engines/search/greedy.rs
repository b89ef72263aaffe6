use crate::engines::oracles::{CorrectnessOracle, PerformanceOracle};
use crate::syntax::SourceProgram;
use crate::transforms::{RuleKind, TransformRegistry};
use crate::types::VariantReport;
use std::time::{Duration, Instant};

/// A candidate program together with the rules that produced it.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub program: SourceProgram,
    pub rules: Vec<RuleKind>,
}

impl Variant {
    pub fn original(program: &SourceProgram) -> Self {
        Self {
            name: "original".to_string(),
            program: program.clone(),
            rules: Vec::new(),
        }
    }
}

/// The original followed by one variant per applicable rule, in registry
/// order. NoOp is the original and is not repeated; a rewrite that leaves
/// the text unchanged is not a variant.
pub fn generate_variants(original: &SourceProgram, fn_name: &str, registry: &TransformRegistry) -> Vec<Variant> {
    let mut variants = vec![Variant::original(original)];

    for rule in registry.iter() {
        let kind = rule.kind();
        if kind == RuleKind::NoOp {
            continue;
        }
        let Some(program) = rule.apply(original, fn_name) else {
            log::debug!("{} does not apply to {}", rule.name(), fn_name);
            continue;
        };
        if program == *original {
            log::debug!("{} leaves {} unchanged", rule.name(), fn_name);
            continue;
        }
        variants.push(Variant {
            name: rule.name().to_string(),
            program,
            rules: vec![kind],
        });
    }
    variants
}

#[derive(Debug, Clone)]
pub struct GreedyOutcome {
    pub best: Option<Variant>,
    pub best_time: Option<f64>,
    pub baseline_time: Option<f64>,
    pub reports: Vec<VariantReport>,
}

/// Correctness check and timing for one variant.
pub trait VariantScorer {
    fn passes(&self, program: &SourceProgram) -> bool;

    /// Seconds taken and exit code of one timing run.
    fn time(&self, program: &SourceProgram) -> (Option<f64>, Option<i32>);
}

/// Scores variants with the sandboxed oracles.
pub struct OracleScorer<'a> {
    correctness: &'a CorrectnessOracle,
    performance: &'a PerformanceOracle,
}

impl<'a> OracleScorer<'a> {
    pub fn new(correctness: &'a CorrectnessOracle, performance: &'a PerformanceOracle) -> Self {
        Self {
            correctness,
            performance,
        }
    }
}

impl VariantScorer for OracleScorer<'_> {
    fn passes(&self, program: &SourceProgram) -> bool {
        self.correctness.check(program.text())
    }

    fn time(&self, program: &SourceProgram) -> (Option<f64>, Option<i32>) {
        let result = self.performance.run(program.text());
        (result.elapsed_seconds, result.exit_code)
    }
}

/// Times every single-rule variant until the soft deadline passes and keeps
/// the fastest.
pub struct GreedyRunner<'a> {
    scorer: &'a dyn VariantScorer,
    time_budget: Duration,
}

impl<'a> GreedyRunner<'a> {
    pub fn new(scorer: &'a dyn VariantScorer, time_budget: Duration) -> Self {
        Self { scorer, time_budget }
    }

    /// The first variant (the original) is always timed. The deadline is
    /// only checked between variants, so one slow run can overshoot it.
    pub fn run(&self, variants: Vec<Variant>) -> GreedyOutcome {
        let start = Instant::now();
        let mut outcome = GreedyOutcome {
            best: None,
            best_time: None,
            baseline_time: None,
            reports: Vec::with_capacity(variants.len()),
        };

        for (index, variant) in variants.into_iter().enumerate() {
            if index > 0 && start.elapsed() > self.time_budget {
                log::info!("Time budget exhausted; skipping {} and later variants", variant.name);
                break;
            }

            let is_original = index == 0;
            let passed_correctness = is_original || self.scorer.passes(&variant.program);
            let (elapsed, exit_code) = if passed_correctness {
                self.scorer.time(&variant.program)
            } else {
                (None, None)
            };

            match elapsed {
                Some(t) => log::info!("{}: {:.6}s", variant.name, t),
                None if !passed_correctness => log::info!("{}: rejected by correctness check", variant.name),
                None => log::info!("{}: failed (exit {:?})", variant.name, exit_code),
            }

            outcome.reports.push(VariantReport {
                name: variant.name.clone(),
                elapsed,
                exit_code,
                passed_correctness,
            });
            if is_original {
                outcome.baseline_time = elapsed;
            }

            if let Some(t) = elapsed {
                if outcome.best_time.map_or(true, |best| t < best) {
                    outcome.best_time = Some(t);
                    outcome.best = Some(variant);
                }
            }
        }

        outcome
    }
}
