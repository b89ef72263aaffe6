use super::evaluator::Evaluator;
use super::genome::Genome;
use super::operators::{mutate, random_genome, tournament_selection, two_point_crossover};
use super::progress::SearchProgress;
use super::strategy::{SearchOutcome, SearchStrategy};
use crate::config::SearchConfig;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

pub struct EvolutionConfig {
    pub population_size: usize,
    pub genome_length: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub gene_mutation_rate: f64,
    pub time_budget: Duration,
    pub seed: Option<u64>,
}

impl From<&SearchConfig> for EvolutionConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            population_size: config.population_size,
            genome_length: config.genome_length,
            tournament_size: config.tournament_size,
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
            gene_mutation_rate: config.gene_mutation_rate,
            time_budget: config.time_budget(),
            seed: config.seed,
        }
    }
}

/// Generational genetic search over rule sequences.
///
/// Each generation every individual is scored, the global best is
/// updated, and the next population is bred by tournament selection,
/// pairwise two-point crossover and per-gene mutation. The time budget is
/// checked between generations only.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: StdRng,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Run the evolution process
    pub fn run(&mut self, evaluator: &mut dyn Evaluator, progress: &mut dyn SearchProgress) -> SearchOutcome {
        let mut outcome = SearchOutcome::empty();
        let gene_count = evaluator.gene_count();
        if gene_count == 0 || self.config.population_size == 0 || self.config.genome_length == 0 {
            return outcome;
        }

        let mut population = self.initialize_population(gene_count);
        let start = Instant::now();
        let mut generation = 0;

        while start.elapsed() < self.config.time_budget {
            progress.on_generation_start(generation);

            let mut evaluated: Vec<(Genome, f64)> = Vec::with_capacity(population.len());
            for genome in population {
                let evaluation = evaluator.evaluate(&genome);
                let fitness = evaluation.fitness;
                progress.on_candidate_evaluated(&genome, fitness);
                outcome.observe(&genome, evaluation);
                evaluated.push((genome, fitness));
            }

            progress.on_generation_complete(generation, outcome.best_fitness);
            population = self.create_next_generation(&evaluated, gene_count);
            generation += 1;
        }

        outcome.generations = generation;
        outcome
    }

    fn initialize_population(&mut self, gene_count: usize) -> Vec<Genome> {
        (0..self.config.population_size)
            .map(|_| random_genome(self.config.genome_length, 0..gene_count, &mut self.rng))
            .collect()
    }

    fn create_next_generation(&mut self, evaluated: &[(Genome, f64)], gene_count: usize) -> Vec<Genome> {
        let mut offspring: Vec<Genome> = (0..evaluated.len())
            .map(|_| tournament_selection(evaluated, self.config.tournament_size, &mut self.rng))
            .collect();

        for pair in offspring.chunks_exact_mut(2) {
            if self.rng.gen::<f64>() < self.config.crossover_rate {
                let (left, right) = pair.split_at_mut(1);
                two_point_crossover(&mut left[0], &mut right[0], &mut self.rng);
            }
        }

        for mutant in offspring.iter_mut() {
            if self.rng.gen::<f64>() < self.config.mutation_rate {
                mutate(mutant, self.config.gene_mutation_rate, 0..gene_count, &mut self.rng);
            }
        }

        offspring
    }
}

impl SearchStrategy for EvolutionEngine {
    fn name(&self) -> &'static str {
        "evolutionary"
    }

    fn search(&mut self, evaluator: &mut dyn Evaluator, progress: &mut dyn SearchProgress) -> SearchOutcome {
        self.run(evaluator, progress)
    }
}
