use super::evaluator::{Evaluation, Evaluator};
use super::genome::Genome;
use super::progress::SearchProgress;
use super::random_search::RandomSearch;
use crate::config::{SearchConfig, SearchMode};
use crate::types::REJECTED;
use serde::Serialize;

/// Best candidate found by a search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub best_source: Option<String>,
    pub best_fitness: f64,
    pub best_genome: Option<Genome>,
    pub evaluations: usize,
    pub generations: usize,
}

impl SearchOutcome {
    pub fn empty() -> Self {
        Self {
            best_source: None,
            best_fitness: REJECTED,
            best_genome: None,
            evaluations: 0,
            generations: 0,
        }
    }

    /// Records an evaluation; only a strictly better fitness replaces the
    /// current best, so the first of equal candidates wins.
    pub fn observe(&mut self, genome: &[usize], evaluation: Evaluation) {
        self.evaluations += 1;
        if evaluation.fitness < self.best_fitness {
            self.best_fitness = evaluation.fitness;
            self.best_source = Some(evaluation.source);
            self.best_genome = Some(genome.to_vec());
        }
    }
}

pub trait SearchStrategy {
    fn name(&self) -> &'static str;

    fn search(&mut self, evaluator: &mut dyn Evaluator, progress: &mut dyn SearchProgress) -> SearchOutcome;
}

/// Picks the search implementation once, up front.
///
/// Builds without the `evolution` feature have no genetic search and fall
/// back to random sampling.
pub fn build_strategy(config: &SearchConfig) -> Box<dyn SearchStrategy> {
    match config.mode {
        SearchMode::Evolutionary => evolutionary(config),
        _ => Box::new(RandomSearch::new(config.into())),
    }
}

#[cfg(feature = "evolution")]
fn evolutionary(config: &SearchConfig) -> Box<dyn SearchStrategy> {
    Box::new(super::evolution_engine::EvolutionEngine::new(config.into()))
}

#[cfg(not(feature = "evolution"))]
fn evolutionary(config: &SearchConfig) -> Box<dyn SearchStrategy> {
    log::warn!("Built without evolutionary search; using random search instead");
    Box::new(RandomSearch::new(config.into()))
}
