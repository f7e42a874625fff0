//! Differential evolution (rand/1/bin).

use at_types::is_invalid_cost;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coords::{clamp_capped, clamp_mod, random_coordinates, valid_coordinates};
use crate::technique::{CoordinateTechnique, Coordinates, Cost};

/// Population size; at least 4 so three distinct donors exist.
const NUM_VECTORS: usize = 30;
/// Mutation factor scaling the donor difference.
const F_VAL: f64 = 0.7;
/// Per-component crossover rate.
const CR: f64 = 0.2;
/// Retries for a trial vector that left the coordinate space before folding.
const INVALID_RETRIES: usize = 1;

/// Differential evolution over `(0,1]^D`: for each target vector a donor
/// `a + F·(b − c)` is built from three distinct other population members,
/// binomially crossed with the target, and kept when it does not cost more.
pub struct DifferentialEvolution {
    dimensionality: usize,
    population: Vec<Coordinates>,
    /// `None` until the member's initial cost has been seeded.
    population_costs: Vec<Option<Cost>>,
    trial: Coordinates,
    current: usize,
    rng: StdRng,
}

impl DifferentialEvolution {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            dimensionality: 0,
            population: Vec::new(),
            population_costs: Vec::new(),
            trial: Vec::new(),
            current: 0,
            rng,
        }
    }

    /// Three distinct population indices, all different from the target.
    fn donor_indices(&mut self) -> [usize; 3] {
        let mut picked = [0usize; 3];
        for i in 0..3 {
            loop {
                let candidate = self.rng.gen_range(0..NUM_VECTORS);
                if candidate != self.current && !picked[..i].contains(&candidate) {
                    picked[i] = candidate;
                    break;
                }
            }
        }
        picked
    }

    fn donor_component(&self, component: usize, donors: &[usize; 3]) -> f64 {
        self.population[donors[0]][component]
            + F_VAL
                * (self.population[donors[1]][component]
                    - self.population[donors[2]][component])
    }

    fn build_trial(&mut self) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let forced = self.rng.gen_range(0..self.dimensionality);
            let donors = self.donor_indices();
            self.trial = (0..self.dimensionality)
                .map(|i| {
                    if self.rng.gen::<f64>() <= CR || i == forced {
                        self.donor_component(i, &donors)
                    } else {
                        self.population[self.current][i]
                    }
                })
                .collect();
            if valid_coordinates(&self.trial) || attempts > INVALID_RETRIES {
                break;
            }
        }
        if !valid_coordinates(&self.trial) {
            self.trial = clamp_mod(std::mem::take(&mut self.trial));
        }
    }
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateTechnique for DifferentialEvolution {
    fn initialize(&mut self, dimensionality: usize) {
        self.dimensionality = dimensionality;
        self.current = 0;
        self.population = (0..NUM_VECTORS)
            .map(|_| random_coordinates(&mut self.rng, dimensionality))
            .collect();
        self.population_costs = vec![None; NUM_VECTORS];
        self.trial = random_coordinates(&mut self.rng, dimensionality);
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        if self.population_costs[self.current].is_none() {
            vec![clamp_capped(self.population[self.current].clone())]
        } else {
            self.build_trial();
            vec![clamp_capped(self.trial.clone())]
        }
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        let cost = costs[0].1;
        match self.population_costs[self.current] {
            None => {
                if is_invalid_cost(cost) {
                    // infeasible seed: replace the member and try it again later
                    self.population[self.current] =
                        random_coordinates(&mut self.rng, self.dimensionality);
                } else {
                    self.population_costs[self.current] = Some(cost);
                }
            }
            Some(current_cost) => {
                if cost <= current_cost {
                    self.population[self.current] = self.trial.clone();
                    self.population_costs[self.current] = Some(cost);
                }
            }
        }
        self.current = (self.current + 1) % NUM_VECTORS;
    }

    fn name(&self) -> &'static str {
        "differential_evolution"
    }
}
