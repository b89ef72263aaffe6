pub mod evaluator;
#[cfg(feature = "evolution")]
pub mod evolution_engine;
pub mod genome;
pub mod greedy;
pub mod operators;
pub mod progress;
pub mod random_search;
pub mod strategy;

pub use evaluator::{Evaluation, Evaluator, OracleEvaluator};
#[cfg(feature = "evolution")]
pub use evolution_engine::{EvolutionConfig, EvolutionEngine};
pub use genome::Genome;
pub use greedy::{generate_variants, GreedyOutcome, GreedyRunner, OracleScorer, Variant, VariantScorer};
pub use progress::{LogProgress, SearchProgress};
pub use random_search::{RandomSearch, RandomSearchConfig};
pub use strategy::{build_strategy, SearchOutcome, SearchStrategy};
