/// Observer for search runs.
pub trait SearchProgress {
    fn on_generation_start(&mut self, generation: usize);
    fn on_candidate_evaluated(&mut self, genome: &[usize], fitness: f64);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64);
}

/// Reports progress through the `log` facade.
pub struct LogProgress;

impl SearchProgress for LogProgress {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Generation {} starting...", generation + 1);
    }

    fn on_candidate_evaluated(&mut self, genome: &[usize], fitness: f64) {
        log::debug!("  {:?} -> {}", genome, fitness);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64) {
        log::info!(
            "Generation {} complete. Best fitness so far: {:.6}",
            generation + 1,
            best_fitness
        );
    }
}
