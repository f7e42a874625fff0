//! Particle swarm optimization.

use at_types::is_invalid_cost;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::coords::{clamp_mod, random_coordinates, valid_coordinates, COORD_FLOOR};
use crate::technique::{CoordinateTechnique, Coordinates, Cost};

const DEFAULT_NUM_SWARMS: usize = 1;
const DEFAULT_PARTICLES_PER_SWARM: usize = 30;

/// One particle: where it is, how it moves, and the best point it has seen.
#[derive(Debug, Clone)]
pub struct Particle {
    position: Coordinates,
    velocity: Coordinates,
    best_position: Coordinates,
    best_cost: Cost,
    cost: Cost,
}

impl Particle {
    fn at(position: Coordinates) -> Self {
        let dim = position.len();
        Self {
            best_position: position.clone(),
            position,
            velocity: vec![0.0; dim],
            best_cost: f64::MAX,
            cost: f64::MAX,
        }
    }

    pub fn position(&self) -> &Coordinates {
        &self.position
    }

    pub fn best_position(&self) -> &Coordinates {
        &self.best_position
    }

    fn report_fitness(&mut self, cost: Cost) {
        self.cost = cost;
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_position = self.position.clone();
        }
    }
}

/// Movement rule applied to each particle once per round.
pub trait Crossover {
    fn move_particle(
        &self,
        particle: &mut Particle,
        global_best: &Coordinates,
        rng: &mut StdRng,
    );
}

/// Clerc–Kennedy constriction coefficients: the canonical convergent update
/// `v ← χ(v + φ₁r₁(p − x) + φ₂r₂(g − x))`, `x ← x + v`.
#[derive(Debug, Clone, Copy)]
pub struct Constriction {
    pub chi: f64,
    pub phi_one: f64,
    pub phi_two: f64,
}

impl Default for Constriction {
    fn default() -> Self {
        Self {
            chi: 0.7298,
            phi_one: 2.05,
            phi_two: 2.05,
        }
    }
}

impl Crossover for Constriction {
    fn move_particle(
        &self,
        particle: &mut Particle,
        global_best: &Coordinates,
        rng: &mut StdRng,
    ) {
        for i in 0..particle.position.len() {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            let cognitive = self.phi_one * r1 * (particle.best_position[i] - particle.position[i]);
            let social = self.phi_two * r2 * (global_best[i] - particle.position[i]);
            particle.velocity[i] = self.chi * (particle.velocity[i] + cognitive + social);
            particle.position[i] += particle.velocity[i];
        }
    }
}

/// OpenTuner-style update: damped velocity with Gaussian noise, position
/// mapped through a sigmoid so it stays inside the unit interval.
#[derive(Debug, Clone, Copy)]
pub struct OpenTunerStyle {
    pub damping: f64,
    pub noise_sigma: f64,
}

impl Default for OpenTunerStyle {
    fn default() -> Self {
        Self {
            damping: 0.5,
            noise_sigma: 0.1,
        }
    }
}

impl OpenTunerStyle {
    fn logit(x: f64) -> f64 {
        let x = x.clamp(1e-9, 1.0 - 1e-9);
        (x / (1.0 - x)).ln()
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }
}

impl Crossover for OpenTunerStyle {
    fn move_particle(
        &self,
        particle: &mut Particle,
        global_best: &Coordinates,
        rng: &mut StdRng,
    ) {
        let noise = Normal::new(0.0, self.noise_sigma).expect("positive sigma");
        for i in 0..particle.position.len() {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            particle.velocity[i] = self.damping * particle.velocity[i]
                + r1 * (particle.best_position[i] - particle.position[i])
                + r2 * (global_best[i] - particle.position[i])
                + noise.sample(rng);
            let mapped =
                Self::sigmoid(Self::logit(particle.position[i]) + particle.velocity[i]);
            particle.position[i] = mapped.max(COORD_FLOOR);
        }
    }
}

/// CLTune-style update: each component jumps to the global best, the local
/// best, or a fresh random value, chosen uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CltuneStyle;

impl Crossover for CltuneStyle {
    fn move_particle(
        &self,
        particle: &mut Particle,
        global_best: &Coordinates,
        rng: &mut StdRng,
    ) {
        for i in 0..particle.position.len() {
            particle.position[i] = match rng.gen_range(0..3u8) {
                0 => global_best[i],
                1 => particle.best_position[i],
                _ => 1.0 - rng.gen::<f64>(),
            };
        }
    }
}

/// A swarm of particles with rescue-from-invalid-region behavior: when more
/// than half of a round's reports are invalid, every particle is re-seeded,
/// since a swarm converged on an infeasible region cannot move out of it.
#[derive(Debug, Clone)]
struct Swarm {
    particles: Vec<Particle>,
    invalid_reports: usize,
}

impl Swarm {
    fn seeded(num_particles: usize, dimensionality: usize, rng: &mut StdRng) -> Self {
        Self {
            particles: (0..num_particles)
                .map(|_| Particle::at(random_coordinates(rng, dimensionality)))
                .collect(),
            invalid_reports: 0,
        }
    }

    fn best_position(&self) -> Coordinates {
        self.particles
            .iter()
            .min_by(|a, b| a.best_cost.total_cmp(&b.best_cost))
            .expect("swarm is non-empty")
            .best_position
            .clone()
    }

    fn step<X: Crossover>(&mut self, crossover: &X, rng: &mut StdRng) {
        self.invalid_reports = 0;
        let global_best = self.best_position();
        for particle in &mut self.particles {
            crossover.move_particle(particle, &global_best, rng);
        }
    }

    fn report_fitness(&mut self, cost: Cost, particle_index: usize, rng: &mut StdRng) {
        self.particles[particle_index].report_fitness(cost);
        if is_invalid_cost(cost) {
            self.invalid_reports += 1;
        }
        if self.invalid_reports > self.particles.len() / 2 {
            let dimensionality = self.particles[particle_index].position.len();
            let count = self.particles.len();
            *self = Self::seeded(count, dimensionality, rng);
        }
    }
}

/// Particle swarm search: `num_swarms` independent swarms of
/// `particles_per_swarm` particles each, moved once per full evaluation round
/// by the configured [`Crossover`] rule.
pub struct ParticleSwarm<X: Crossover = Constriction> {
    num_swarms: usize,
    particles_per_swarm: usize,
    crossover: X,
    swarms: Vec<Swarm>,
    pos: usize,
    dimensionality: usize,
    rng: StdRng,
}

impl ParticleSwarm<Constriction> {
    pub fn new() -> Self {
        Self::with_crossover(Constriction::default())
    }
}

impl Default for ParticleSwarm<Constriction> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: Crossover> ParticleSwarm<X> {
    pub fn with_crossover(crossover: X) -> Self {
        Self {
            num_swarms: DEFAULT_NUM_SWARMS,
            particles_per_swarm: DEFAULT_PARTICLES_PER_SWARM,
            crossover,
            swarms: Vec::new(),
            pos: 0,
            dimensionality: 0,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_shape(mut self, num_swarms: usize, particles_per_swarm: usize) -> Self {
        assert!(num_swarms > 0 && particles_per_swarm > 0);
        self.num_swarms = num_swarms;
        self.particles_per_swarm = particles_per_swarm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn swarm_of(&self, pos: usize) -> usize {
        pos / self.particles_per_swarm
    }

    fn particle_of(&self, pos: usize) -> usize {
        pos % self.particles_per_swarm
    }
}

impl<X: Crossover> CoordinateTechnique for ParticleSwarm<X> {
    fn initialize(&mut self, dimensionality: usize) {
        self.dimensionality = dimensionality;
        self.pos = 0;
        self.swarms = (0..self.num_swarms)
            .map(|_| Swarm::seeded(self.particles_per_swarm, dimensionality, &mut self.rng))
            .collect();
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        if self.pos == self.num_swarms * self.particles_per_swarm {
            self.pos = 0;
            for swarm in &mut self.swarms {
                swarm.step(&self.crossover, &mut self.rng);
            }
        }

        let swarm = self.swarm_of(self.pos);
        let particle = self.particle_of(self.pos);
        let p = &mut self.swarms[swarm].particles[particle];
        if !valid_coordinates(&p.position) {
            p.position = clamp_mod(std::mem::take(&mut p.position));
        }
        vec![p.position.clone()]
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        let cost = costs[0].1;
        let swarm = self.swarm_of(self.pos);
        let particle = self.particle_of(self.pos);
        self.swarms[swarm].report_fitness(cost, particle, &mut self.rng);
        self.pos += 1;
    }

    fn name(&self) -> &'static str {
        "particle_swarm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_types::INVALID_COST;

    #[test]
    fn proposes_every_particle_once_per_round() {
        let mut pso = ParticleSwarm::new().with_shape(1, 5).with_seed(3);
        pso.initialize(2);
        let mut seen = Vec::new();
        for _ in 0..5 {
            let batch = pso.next_coordinates();
            seen.push(batch[0].clone());
            pso.report_costs(&[(batch[0].clone(), 1.0)]);
        }
        assert_eq!(seen.len(), 5);
        // next proposal starts a new round: particles have moved
        let batch = pso.next_coordinates();
        assert!(valid_coordinates(&batch[0]));
    }

    #[test]
    fn majority_invalid_reports_reset_the_swarm() {
        let mut pso = ParticleSwarm::new().with_shape(1, 4).with_seed(9);
        pso.initialize(3);
        let before: Vec<_> = pso.swarms[0]
            .particles
            .iter()
            .map(|p| p.position.clone())
            .collect();
        // 3 of 4 invalid crosses the 50 % threshold
        for _ in 0..3 {
            let batch = pso.next_coordinates();
            pso.report_costs(&[(batch[0].clone(), INVALID_COST)]);
        }
        let after: Vec<_> = pso.swarms[0]
            .particles
            .iter()
            .map(|p| p.position.clone())
            .collect();
        assert_ne!(before, after);
        assert_eq!(pso.swarms[0].invalid_reports, 0);
    }

    #[test]
    fn constriction_moves_toward_the_best() {
        let mut particle = Particle::at(vec![0.2, 0.2]);
        particle.best_position = vec![0.2, 0.2];
        let global_best = vec![0.8, 0.8];
        let mut rng = StdRng::seed_from_u64(1);
        Constriction::default().move_particle(&mut particle, &global_best, &mut rng);
        assert!(particle.position[0] > 0.2);
        assert!(particle.position[1] > 0.2);
    }

    #[test]
    fn opentuner_update_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut particle = Particle::at(vec![0.9; 4]);
        let global_best = vec![0.1; 4];
        let xf = OpenTunerStyle::default();
        for _ in 0..50 {
            xf.move_particle(&mut particle, &global_best, &mut rng);
            assert!(valid_coordinates(&particle.position));
        }
    }

    #[test]
    fn cltune_update_picks_known_or_random_components() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut particle = Particle::at(vec![0.4; 2]);
        particle.best_position = vec![0.3; 2];
        let global_best = vec![0.6; 2];
        CltuneStyle.move_particle(&mut particle, &global_best, &mut rng);
        assert!(valid_coordinates(&particle.position));
    }

    #[test]
    fn multiple_swarms_are_independent() {
        let mut pso = ParticleSwarm::new().with_shape(2, 3).with_seed(13);
        pso.initialize(2);
        for round in 0..12 {
            let batch = pso.next_coordinates();
            assert!(valid_coordinates(&batch[0]), "round {round}");
            pso.report_costs(&[(batch[0].clone(), 2.0)]);
        }
    }
}
