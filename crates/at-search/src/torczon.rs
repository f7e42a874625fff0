//! Torczon multi-directional simplex search.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::coords::{add, clamp_capped, random_coordinates, scale};
use crate::technique::{CoordinateTechnique, Coordinates, Cost};

/// Normalized side length of the initial simplex; must lie in (0, 0.5].
const INIT_SIMPLEX_SIDE_LENGTH: f64 = 0.1;

const EXPANSION_FACTOR: f64 = 2.0;
const CONTRACTION_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Reflected,
    Expanded,
}

#[derive(Debug, Clone, Default)]
struct Simplex {
    best_vertex: usize,
    vertices: Vec<Coordinates>,
}

/// Torczon's simplex method: evaluate all D+1 vertices, then reflect the
/// simplex through its best vertex; expand on improvement, contract and
/// restart otherwise.
pub struct Torczon {
    dimensionality: usize,
    base: Simplex,
    test: Simplex,
    /// Which simplex the next vertex proposal is drawn from.
    proposing_test: bool,
    current_vertex: usize,
    center_vertex: usize,
    state: State,
    best_cost: Cost,
    cost_improved: bool,
    rng: StdRng,
}

impl Torczon {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            dimensionality: 0,
            base: Simplex::default(),
            test: Simplex::default(),
            proposing_test: false,
            current_vertex: 0,
            center_vertex: 0,
            state: State::Initial,
            best_cost: f64::MAX,
            cost_improved: true,
            rng,
        }
    }

    fn initial_simplex(&mut self) -> Vec<Coordinates> {
        let base_vertex = random_coordinates(&mut self.rng, self.dimensionality);
        let mut vertices = Vec::with_capacity(self.dimensionality + 1);
        vertices.push(base_vertex.clone());
        for i in 0..self.dimensionality {
            let mut vertex = base_vertex.clone();
            if vertex[i] <= 0.5 {
                vertex[i] += INIT_SIMPLEX_SIDE_LENGTH;
            } else {
                vertex[i] -= INIT_SIMPLEX_SIDE_LENGTH;
            }
            vertices.push(vertex);
        }
        vertices
    }

    /// Scale the base simplex about its center vertex:
    /// `v' = center·(1 − factor) + v·factor`.  Factor −1 reflects, 2
    /// expands, 0.5 contracts.
    fn transform_base(&self, factor: f64) -> Vec<Coordinates> {
        let center = &self.base.vertices[self.center_vertex];
        self.base
            .vertices
            .iter()
            .map(|v| clamp_capped(add(&scale(center, 1.0 - factor), &scale(v, factor))))
            .collect()
    }

    fn current_simplex(&self) -> &Simplex {
        if self.proposing_test {
            &self.test
        } else {
            &self.base
        }
    }

    fn switch_state(&mut self, state: State) {
        self.state = state;
        self.current_vertex = 0;
        self.cost_improved = false;
    }

    fn generate_next_simplex(&mut self) {
        match self.state {
            State::Initial => {
                self.test.vertices = self.transform_base(-1.0);
                self.test.best_vertex = 0;
                self.proposing_test = true;
                self.switch_state(State::Reflected);
            }
            State::Reflected => {
                if self.cost_improved {
                    self.base = self.test.clone();
                    self.test.vertices = self.transform_base(EXPANSION_FACTOR);
                    self.test.best_vertex = 0;
                    self.proposing_test = true;
                    self.switch_state(State::Expanded);
                } else {
                    self.base.vertices = self.transform_base(CONTRACTION_FACTOR);
                    self.base.best_vertex = 0;
                    self.proposing_test = false;
                    self.best_cost = f64::MAX;
                    self.center_vertex = 0;
                    self.switch_state(State::Initial);
                }
            }
            State::Expanded => {
                if self.cost_improved {
                    self.base = self.test.clone();
                }
                self.center_vertex = self.base.best_vertex;
                self.test.vertices = self.transform_base(-1.0);
                self.test.best_vertex = 0;
                self.proposing_test = true;
                self.switch_state(State::Reflected);
            }
        }
    }
}

impl Default for Torczon {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateTechnique for Torczon {
    fn initialize(&mut self, dimensionality: usize) {
        self.dimensionality = dimensionality;
        self.base.vertices = self.initial_simplex();
        self.base.best_vertex = 0;
        self.proposing_test = false;
        self.state = State::Initial;
        self.current_vertex = 0;
        self.center_vertex = 0;
        self.cost_improved = true;
        self.best_cost = f64::MAX;
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        if self.current_vertex == self.dimensionality + 1 {
            self.generate_next_simplex();
        }
        vec![clamp_capped(
            self.current_simplex().vertices[self.current_vertex].clone(),
        )]
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        let cost = costs[0].1;
        if cost < self.best_cost {
            self.best_cost = cost;
            self.cost_improved = true;
            let vertex = self.current_vertex;
            if self.proposing_test {
                self.test.best_vertex = vertex;
            } else {
                self.base.best_vertex = vertex;
            }
            if self.state == State::Initial {
                self.center_vertex = vertex;
            }
        }
        self.current_vertex += 1;
    }

    fn name(&self) -> &'static str {
        "torczon"
    }
}
