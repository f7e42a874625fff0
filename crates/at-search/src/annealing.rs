//! Simulated annealing over the coordinate space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coords::{clamp_capped, random_coordinates};
use crate::technique::{CoordinateTechnique, Coordinates, Cost};

/// Default number of schedule steps between two configured temperatures.
const DEFAULT_INTERP_STEPS: usize = 100;

/// Default temperatures to interpolate between.
const DEFAULT_TEMPS: [f64; 2] = [30.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    ExplorePlus,
    ExploreMinus,
}

/// Simulated annealing: perturbs one coordinate component per proposal,
/// alternating + and −, and accepts a neighbour per cooling step with a
/// Metropolis-style criterion.
///
/// The temperature schedule interpolates linearly between the configured
/// temperatures (30 → 0 by default) and wraps around when exhausted, so the
/// technique keeps producing proposals indefinitely.
pub struct SimulatedAnnealing {
    temps: Vec<f64>,
    interp_steps: usize,

    dimensionality: usize,
    state: State,
    time: usize,
    max_time: usize,
    current_parameter: usize,
    best_cost: Cost,
    temp: f64,
    step_size: f64,
    current: Coordinates,
    best: Coordinates,
    schedule: Vec<f64>,
    neighbours: Vec<(Coordinates, Cost)>,
    rng: StdRng,
}

impl SimulatedAnnealing {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            temps: DEFAULT_TEMPS.to_vec(),
            interp_steps: DEFAULT_INTERP_STEPS,
            dimensionality: 0,
            state: State::Init,
            time: 0,
            max_time: 0,
            current_parameter: 0,
            best_cost: f64::MAX,
            temp: 0.0,
            step_size: 0.0,
            current: Vec::new(),
            best: Vec::new(),
            schedule: Vec::new(),
            neighbours: Vec::new(),
            rng,
        }
    }

    fn interp(a: f64, b: f64, t: f64) -> f64 {
        debug_assert!((0.0..=1.0).contains(&t));
        a + t * (b - a)
    }

    /// Perturbation magnitude for the given cooling step.
    fn step_size_at(time: usize, temp: f64) -> f64 {
        (-(20.0 + time as f64 / 100.0) / (temp + 1.0)).exp()
    }

    /// Metropolis acceptance probability for relative energies, guarded
    /// against zero temperature and extreme exponents.
    fn acceptance(e: f64, e_new: f64, temp: f64) -> f64 {
        if e >= e_new {
            return 1.0;
        }
        if temp == 0.0 {
            return 0.0;
        }
        if 50.0 * (e_new - e) / temp > 10.0 {
            return 0.0;
        }
        (50.0 * (e - e_new) / temp).exp()
    }

    fn relative(cost: f64, reference: f64) -> f64 {
        if reference == 0.0 {
            f64::INFINITY
        } else {
            cost / reference
        }
    }

    fn advance_time(&mut self) {
        self.time += 1;
        if self.time > self.max_time {
            self.time -= self.max_time;
        }
        self.temp = self.schedule[self.time.min(self.max_time)];
        self.step_size = Self::step_size_at(self.time, self.temp);
    }

    /// Draw the next accepted state from the neighbour pool, sampling without
    /// replacement; falls back to the best-known point when the pool drains.
    fn accept_neighbour(&mut self) -> (Coordinates, Cost) {
        loop {
            if self.neighbours.is_empty() {
                return (self.best.clone(), self.best_cost);
            }
            let candidate = self.rng.gen_range(0..self.neighbours.len());
            let probability = Self::acceptance(
                1.0,
                Self::relative(self.neighbours[candidate].1, self.best_cost),
                self.temp,
            );
            if self.rng.gen::<f64>() < probability {
                return self.neighbours[candidate].clone();
            }
            self.neighbours.remove(candidate);
        }
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateTechnique for SimulatedAnnealing {
    fn initialize(&mut self, dimensionality: usize) {
        self.dimensionality = dimensionality;
        self.state = State::Init;
        self.time = 0;
        self.schedule.clear();
        for t in 0..self.temps.len() - 1 {
            for steps in (1..=self.interp_steps).rev() {
                self.schedule.push(Self::interp(
                    self.temps[t + 1],
                    self.temps[t],
                    steps as f64 / self.interp_steps as f64,
                ));
            }
        }
        self.schedule.push(*self.temps.last().expect("temps set"));
        self.max_time = self.schedule.len() - 1;
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        match self.state {
            State::Init => {
                self.current_parameter = 0;
                self.temp = self.schedule[self.time.min(self.max_time)];
                self.step_size = Self::step_size_at(self.time, self.temp);
                self.current = random_coordinates(&mut self.rng, self.dimensionality);
                self.neighbours.clear();
                self.neighbours.push((self.current.clone(), 0.0));
                vec![clamp_capped(self.current.clone())]
            }
            State::ExplorePlus => {
                let mut neighbour = self.current.clone();
                if self.current[self.current_parameter] < 1.0 {
                    neighbour[self.current_parameter] +=
                        self.step_size * self.rng.gen::<f64>();
                } else {
                    // component already at the upper bound: skip the + probe
                    self.state = State::ExploreMinus;
                    neighbour[self.current_parameter] -=
                        self.step_size * self.rng.gen::<f64>();
                }
                self.neighbours.push((neighbour.clone(), 0.0));
                vec![clamp_capped(neighbour)]
            }
            State::ExploreMinus => {
                let mut neighbour = self.current.clone();
                neighbour[self.current_parameter] -= self.step_size * self.rng.gen::<f64>();
                self.neighbours.push((neighbour.clone(), 0.0));
                vec![clamp_capped(neighbour)]
            }
        }
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        let cost = costs[0].1;
        match self.state {
            State::Init => {
                self.neighbours[0].1 = cost;
                self.best = costs[0].0.clone();
                self.best_cost = cost;
                self.state = State::ExplorePlus;
            }
            State::ExplorePlus => {
                let last = self.neighbours.last_mut().expect("probe was recorded");
                last.1 = cost;
                if cost < self.best_cost {
                    self.best = last.0.clone();
                    self.best_cost = cost;
                }
                self.state = State::ExploreMinus;
            }
            State::ExploreMinus => {
                let last = self.neighbours.last_mut().expect("probe was recorded");
                last.1 = cost;
                if cost < self.best_cost {
                    self.best = last.0.clone();
                    self.best_cost = cost;
                }
                self.current_parameter += 1;
                if self.current_parameter == self.dimensionality {
                    self.current_parameter = 0;
                    let (next, next_cost) = self.accept_neighbour();
                    self.current = next;
                    self.advance_time();
                    self.neighbours.clear();
                    self.neighbours.push((self.current.clone(), next_cost));
                }
                self.state = State::ExplorePlus;
            }
        }
    }

    fn name(&self) -> &'static str {
        "simulated_annealing"
    }
}
