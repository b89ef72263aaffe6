use super::evaluator::Evaluator;
use super::operators::random_genome;
use super::progress::SearchProgress;
use super::strategy::{SearchOutcome, SearchStrategy};
use crate::config::SearchConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

pub struct RandomSearchConfig {
    pub genome_length: usize,
    pub iterations: usize,
    pub time_budget: Duration,
    pub seed: Option<u64>,
}

impl From<&SearchConfig> for RandomSearchConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            genome_length: config.genome_length,
            iterations: config.random_iterations,
            time_budget: config.time_budget(),
            seed: config.seed,
        }
    }
}

/// Scores fresh random genomes until the budget or the iteration cap runs out.
pub struct RandomSearch {
    config: RandomSearchConfig,
    rng: StdRng,
}

impl RandomSearch {
    pub fn new(config: RandomSearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }
}

impl SearchStrategy for RandomSearch {
    fn name(&self) -> &'static str {
        "random"
    }

    fn search(&mut self, evaluator: &mut dyn Evaluator, progress: &mut dyn SearchProgress) -> SearchOutcome {
        let mut outcome = SearchOutcome::empty();
        let gene_count = evaluator.gene_count();
        if gene_count == 0 {
            return outcome;
        }

        let start = Instant::now();
        for _ in 0..self.config.iterations {
            if start.elapsed() > self.config.time_budget {
                break;
            }
            let genome = random_genome(self.config.genome_length, 0..gene_count, &mut self.rng);
            let evaluation = evaluator.evaluate(&genome);
            progress.on_candidate_evaluated(&genome, evaluation.fitness);
            outcome.observe(&genome, evaluation);
        }

        log::info!(
            "Random search finished after {} evaluations, best fitness {}",
            outcome.evaluations,
            outcome.best_fitness
        );
        outcome
    }
}
