use eca::config::{SearchConfig, SearchMode};
use eca::engines::search::{
    build_strategy, Evaluation, Evaluator, RandomSearch, RandomSearchConfig, SearchProgress, SearchStrategy,
};
use std::time::Duration;

/// Scores genomes without running anything: fitness is the sum of genes,
/// and any genome containing `poison` is rejected.
struct FakeEvaluator {
    genes: usize,
    poison: Option<usize>,
    observed: Vec<f64>,
}

impl FakeEvaluator {
    fn new(genes: usize) -> Self {
        Self {
            genes,
            poison: None,
            observed: Vec::new(),
        }
    }
}

impl Evaluator for FakeEvaluator {
    fn gene_count(&self) -> usize {
        self.genes
    }

    fn evaluate(&mut self, genome: &[usize]) -> Evaluation {
        let fitness = if self.poison.is_some_and(|p| genome.contains(&p)) {
            f64::INFINITY
        } else {
            1.0 + genome.iter().sum::<usize>() as f64
        };
        self.observed.push(fitness);
        Evaluation {
            source: format!("{:?}", genome),
            fitness,
        }
    }
}

#[derive(Default)]
struct RecordingProgress {
    generations_started: usize,
    generations_completed: usize,
    best_per_generation: Vec<f64>,
}

impl SearchProgress for RecordingProgress {
    fn on_generation_start(&mut self, _generation: usize) {
        self.generations_started += 1;
    }

    fn on_candidate_evaluated(&mut self, _genome: &[usize], _fitness: f64) {}

    fn on_generation_complete(&mut self, _generation: usize, best_fitness: f64) {
        self.generations_completed += 1;
        self.best_per_generation.push(best_fitness);
    }
}

fn search_config(mode: SearchMode, budget_secs: f64) -> SearchConfig {
    SearchConfig {
        mode,
        time_budget_secs: budget_secs,
        seed: Some(42),
        ..SearchConfig::default()
    }
}

#[cfg(feature = "evolution")]
#[test]
fn test_evolution_best_is_minimum_of_observed() {
    let mut strategy = build_strategy(&search_config(SearchMode::Evolutionary, 0.2));
    assert_eq!(strategy.name(), "evolutionary");

    let mut evaluator = FakeEvaluator::new(4);
    let mut progress = RecordingProgress::default();
    let outcome = strategy.search(&mut evaluator, &mut progress);

    assert!(outcome.generations >= 1);
    assert_eq!(outcome.evaluations, evaluator.observed.len());
    assert_eq!(outcome.evaluations, outcome.generations * 10);
    for fitness in &evaluator.observed {
        assert!(outcome.best_fitness <= *fitness);
    }
    let genome = outcome.best_genome.expect("a finite candidate was seen");
    assert_eq!(genome.len(), 3);
    assert_eq!(outcome.best_source, Some(format!("{:?}", genome)));

    assert_eq!(progress.generations_started, outcome.generations);
    assert_eq!(progress.generations_completed, outcome.generations);
    assert!(progress.best_per_generation.windows(2).all(|w| w[1] <= w[0]));
}

#[cfg(feature = "evolution")]
#[test]
fn test_evolution_with_all_rejected() {
    let mut strategy = build_strategy(&search_config(SearchMode::Evolutionary, 0.05));
    let mut evaluator = FakeEvaluator::new(1);
    evaluator.poison = Some(0);
    let outcome = strategy.search(&mut evaluator, &mut RecordingProgress::default());

    assert!(outcome.evaluations > 0);
    assert!(outcome.best_source.is_none());
    assert!(outcome.best_fitness.is_infinite());
}

#[cfg(feature = "evolution")]
#[test]
fn test_zero_budget_runs_no_generation() {
    let mut strategy = build_strategy(&search_config(SearchMode::Evolutionary, 0.0));
    let mut evaluator = FakeEvaluator::new(4);
    let outcome = strategy.search(&mut evaluator, &mut RecordingProgress::default());

    assert_eq!(outcome.generations, 0);
    assert!(evaluator.observed.is_empty());
    assert!(outcome.best_source.is_none());
}

#[test]
fn test_random_search_respects_iteration_cap() {
    let mut strategy = RandomSearch::new(RandomSearchConfig {
        genome_length: 3,
        iterations: 25,
        time_budget: Duration::from_secs(60),
        seed: Some(7),
    });
    let mut evaluator = FakeEvaluator::new(4);
    let outcome = strategy.search(&mut evaluator, &mut RecordingProgress::default());

    assert_eq!(outcome.evaluations, 25);
    let min = evaluator.observed.iter().cloned().fold(f64::INFINITY, f64::min);
    assert_eq!(outcome.best_fitness, min);
}

#[test]
fn test_random_mode_is_selected() {
    let strategy = build_strategy(&search_config(SearchMode::Random, 1.0));
    assert_eq!(strategy.name(), "random");
}

#[cfg(not(feature = "evolution"))]
#[test]
fn test_evolutionary_falls_back_to_random() {
    let strategy = build_strategy(&search_config(SearchMode::Evolutionary, 1.0));
    assert_eq!(strategy.name(), "random");
}

#[test]
fn test_seeded_runs_repeat() {
    let config = RandomSearchConfig {
        genome_length: 3,
        iterations: 10,
        time_budget: Duration::from_secs(60),
        seed: Some(3),
    };
    let mut first = FakeEvaluator::new(5);
    RandomSearch::new(config).search(&mut first, &mut RecordingProgress::default());

    let config = RandomSearchConfig {
        genome_length: 3,
        iterations: 10,
        time_budget: Duration::from_secs(60),
        seed: Some(3),
    };
    let mut second = FakeEvaluator::new(5);
    RandomSearch::new(config).search(&mut second, &mut RecordingProgress::default());

    assert_eq!(first.observed, second.observed);
}
