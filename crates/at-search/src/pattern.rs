//! Hooke–Jeeves pattern search.

use at_types::is_invalid_cost;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::coords::{add, clamp_capped, clamp_mod, random_coordinates, sub};
use crate::technique::{CoordinateTechnique, Coordinates, Cost};

const INITIAL_STEP_SIZE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    ExploratoryPlus,
    ExploratoryMinus,
    Pattern,
}

/// Hooke–Jeeves direct search: exploratory ± probes per parameter around a
/// base point, a pattern move along the improvement direction when a full
/// pass improved, and step halving when it did not.
pub struct PatternSearch {
    dimensionality: usize,
    base: Coordinates,
    base_cost: Cost,
    exploratory: Coordinates,
    exploratory_cost: Cost,
    pattern: Coordinates,
    pattern_cost: Cost,
    /// Set when the + probe improved; the − probe then has to step back twice.
    trigger: bool,
    current_parameter: usize,
    step_size: f64,
    state: State,
    rng: StdRng,
}

impl PatternSearch {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            dimensionality: 0,
            base: Vec::new(),
            base_cost: f64::MAX,
            exploratory: Vec::new(),
            exploratory_cost: f64::MAX,
            pattern: Vec::new(),
            pattern_cost: f64::MAX,
            trigger: false,
            current_parameter: 0,
            step_size: INITIAL_STEP_SIZE,
            state: State::Init,
            rng,
        }
    }
}

impl Default for PatternSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateTechnique for PatternSearch {
    fn initialize(&mut self, dimensionality: usize) {
        self.dimensionality = dimensionality;
        self.base = random_coordinates(&mut self.rng, dimensionality);
        self.trigger = false;
        self.step_size = INITIAL_STEP_SIZE;
        self.current_parameter = 0;
        self.state = State::Init;
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        match self.state {
            State::Init => {
                self.exploratory = self.base.clone();
                self.pattern = self.base.clone();
                vec![clamp_capped(self.base.clone())]
            }
            State::ExploratoryPlus => {
                let mut probe = self.exploratory.clone();
                probe[self.current_parameter] += self.step_size;
                vec![clamp_capped(probe)]
            }
            State::ExploratoryMinus => {
                let mut probe = self.exploratory.clone();
                let factor = if self.trigger { 2.0 } else { 1.0 };
                probe[self.current_parameter] -= factor * self.step_size;
                vec![clamp_capped(probe)]
            }
            State::Pattern => vec![clamp_capped(self.pattern.clone())],
        }
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        let cost = costs[0].1;
        match self.state {
            State::Init => {
                if is_invalid_cost(cost) {
                    // restart from a fresh point until the base is feasible
                    self.base = random_coordinates(&mut self.rng, self.dimensionality);
                    return;
                }
                self.base_cost = cost;
                self.exploratory_cost = cost;
                self.pattern_cost = cost;
                self.state = State::ExploratoryPlus;
            }
            State::ExploratoryPlus => {
                if cost < self.exploratory_cost {
                    self.exploratory[self.current_parameter] += self.step_size;
                    self.exploratory = clamp_mod(std::mem::take(&mut self.exploratory));
                    self.exploratory_cost = cost;
                    self.trigger = true;
                }
                self.state = State::ExploratoryMinus;
            }
            State::ExploratoryMinus => {
                if cost < self.exploratory_cost {
                    let factor = if self.trigger { 2.0 } else { 1.0 };
                    self.exploratory[self.current_parameter] -= factor * self.step_size;
                    self.exploratory = clamp_mod(std::mem::take(&mut self.exploratory));
                    self.exploratory_cost = cost;
                }
                self.trigger = false;
                self.current_parameter += 1;

                if self.current_parameter == self.dimensionality {
                    if self.exploratory_cost < self.pattern_cost {
                        self.pattern = clamp_mod(add(
                            &self.exploratory,
                            &sub(&self.exploratory, &self.base),
                        ));
                        self.base = self.exploratory.clone();
                        self.base_cost = self.exploratory_cost;
                        self.exploratory = self.pattern.clone();
                        self.state = State::Pattern;
                    } else {
                        self.exploratory = self.base.clone();
                        self.pattern = self.base.clone();
                        self.pattern_cost = self.base_cost;
                        self.exploratory_cost = self.base_cost;
                        self.step_size *= 0.5;
                        self.state = State::ExploratoryPlus;
                    }
                    self.current_parameter = 0;
                } else {
                    self.state = State::ExploratoryPlus;
                }
            }
            State::Pattern => {
                self.pattern_cost = cost;
                self.exploratory_cost = cost;
                self.state = State::ExploratoryPlus;
            }
        }
    }

    fn name(&self) -> &'static str {
        "pattern_search"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::valid_coordinates;

    /// Quadratic bowl with minimum at (0.5, …, 0.5).
    fn bowl(coords: &[f64]) -> f64 {
        coords.iter().map(|c| (c - 0.5) * (c - 0.5)).sum()
    }

    #[test]
    fn converges_toward_a_quadratic_minimum() {
        let mut ps = PatternSearch::with_seed(11);
        ps.initialize(2);
        let mut best = f64::MAX;
        for _ in 0..400 {
            let batch = ps.next_coordinates();
            let cost = bowl(&batch[0]);
            best = best.min(cost);
            let reported: Vec<_> = batch.into_iter().map(|c| (c, cost)).collect();
            ps.report_costs(&reported);
        }
        assert!(best < 1e-3, "best cost {best} did not approach the minimum");
    }

    #[test]
    fn invalid_initial_point_restarts() {
        let mut ps = PatternSearch::with_seed(5);
        ps.initialize(3);
        let first = ps.next_coordinates();
        let base_before = first[0].clone();
        ps.report_costs(&[(base_before.clone(), at_types::INVALID_COST)]);
        assert_eq!(ps.state, State::Init);
        let second = ps.next_coordinates();
        assert_ne!(second[0], base_before);
    }

    #[test]
    fn step_size_halves_after_unimproved_pass() {
        let mut ps = PatternSearch::with_seed(9);
        ps.initialize(1);
        // seed the base
        let batch = ps.next_coordinates();
        ps.report_costs(&[(batch[0].clone(), 1.0)]);
        // both probes worse: pass fails, step halves
        for _ in 0..2 {
            let batch = ps.next_coordinates();
            ps.report_costs(&[(batch[0].clone(), 2.0)]);
        }
        assert_eq!(ps.step_size, INITIAL_STEP_SIZE * 0.5);
    }

    #[test]
    fn proposals_stay_in_coordinate_space() {
        let mut ps = PatternSearch::with_seed(2);
        ps.initialize(3);
        for i in 0..300 {
            let batch = ps.next_coordinates();
            assert!(valid_coordinates(&batch[0]));
            let cost = 100.0 - i as f64 * 0.1;
            let reported: Vec<_> = batch.into_iter().map(|c| (c, cost)).collect();
            ps.report_costs(&reported);
        }
    }
}
