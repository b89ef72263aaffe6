use super::traits::ConfigSection;
use crate::error::{EcaError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Greedy,
    Evolutionary,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub time_budget_secs: f64,
    pub genome_length: usize,
    pub population_size: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub gene_mutation_rate: f64,
    /// Iteration cap for random search.
    pub random_iterations: usize,
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Greedy,
            time_budget_secs: 10.0,
            genome_length: 3,
            population_size: 10,
            tournament_size: 3,
            crossover_rate: 0.5,
            mutation_rate: 0.2,
            gene_mutation_rate: 0.2,
            random_iterations: 50,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs_f64(self.time_budget_secs.max(0.0))
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<()> {
        if !self.time_budget_secs.is_finite() || self.time_budget_secs < 0.0 {
            return Err(EcaError::Configuration(
                "Time budget must be a non-negative number of seconds".to_string(),
            ));
        }
        if self.genome_length == 0 {
            return Err(EcaError::Configuration("Genome length must be at least 1".to_string()));
        }
        if self.population_size < 2 {
            return Err(EcaError::Configuration("Population size must be at least 2".to_string()));
        }
        if self.tournament_size == 0 {
            return Err(EcaError::Configuration("Tournament size must be at least 1".to_string()));
        }
        for (name, rate) in [
            ("Crossover rate", self.crossover_rate),
            ("Mutation rate", self.mutation_rate),
            ("Gene mutation rate", self.gene_mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EcaError::Configuration(format!("{} must be between 0 and 1", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.genome_length, 3);
        assert_eq!(config.population_size, 10);
        assert_eq!(config.time_budget(), Duration::from_secs(10));
    }

    #[test]
    fn test_rate_bounds() {
        let config = SearchConfig {
            mutation_rate: 1.5,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_names() {
        let mode: SearchMode = serde_json::from_str("\"evolutionary\"").unwrap();
        assert_eq!(mode, SearchMode::Evolutionary);
        assert_eq!(serde_json::to_string(&SearchMode::Greedy).unwrap(), "\"greedy\"");
    }
}
