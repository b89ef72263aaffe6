use super::genome::Genome;
use rand::Rng;

/// Tournament selection: best (lowest fitness) of K candidates drawn with
/// replacement. Ties keep the earlier draw.
pub fn tournament_selection<R: Rng>(
    population: &[(Genome, f64)],
    tournament_size: usize,
    rng: &mut R,
) -> Genome {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].1;

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].1 < best_fitness {
            best_idx = idx;
            best_fitness = population[idx].1;
        }
    }

    population[best_idx].0.clone()
}

/// Two-point crossover in place: the genes between two cut points are
/// swapped between the parents.
pub fn two_point_crossover<R: Rng>(first: &mut Genome, second: &mut Genome, rng: &mut R) {
    let size = first.len().min(second.len());
    if size < 2 {
        return;
    }

    let mut a = rng.gen_range(1..=size);
    let mut b = rng.gen_range(1..size);
    if b >= a {
        b += 1;
    } else {
        std::mem::swap(&mut a, &mut b);
    }

    first[a..b].swap_with_slice(&mut second[a..b]);
}

/// Mutation: each gene is resampled uniformly with probability `gene_rate`.
pub fn mutate<R: Rng>(
    genome: &mut Genome,
    gene_rate: f64,
    gene_range: std::ops::Range<usize>,
    rng: &mut R,
) {
    for gene in genome.iter_mut() {
        if rng.gen::<f64>() < gene_rate {
            *gene = rng.gen_range(gene_range.clone());
        }
    }
}

/// Generate random genome
pub fn random_genome<R: Rng>(
    length: usize,
    gene_range: std::ops::Range<usize>,
    rng: &mut R,
) -> Genome {
    (0..length)
        .map(|_| rng.gen_range(gene_range.clone()))
        .collect()
}
