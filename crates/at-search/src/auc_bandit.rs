//! AUC multi-armed-bandit meta-technique.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::annealing::SimulatedAnnealing;
use crate::pattern::PatternSearch;
use crate::technique::{CoordinateTechnique, Coordinates, Cost};
use crate::torczon::Torczon;

pub const DEFAULT_C: f64 = 0.05;
pub const DEFAULT_WINDOW_SIZE: usize = 500;

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    technique_index: usize,
    cost_improved: bool,
}

/// Multi-armed bandit over child techniques, scored by the area under each
/// child's improvement curve plus a UCB exploration term, over a sliding
/// window of recent uses.
///
/// Recent improvements weigh more than old ones: an improving use scores its
/// position from the old end of the window, and eviction removes that weight
/// symmetrically.
pub struct AucBandit {
    c: f64,
    window_size: usize,
    children: Vec<Box<dyn CoordinateTechnique>>,
    current: usize,
    best_cost: Cost,
    history: VecDeque<HistoryEntry>,
    uses: Vec<usize>,
    raw_auc: Vec<usize>,
    decay: Vec<usize>,
    rng: StdRng,
}

impl AucBandit {
    /// Bandit over the default child trio: simulated annealing, pattern
    /// search, and Torczon simplex.
    pub fn new() -> Self {
        Self::with_children(vec![
            Box::new(SimulatedAnnealing::new()),
            Box::new(PatternSearch::new()),
            Box::new(Torczon::new()),
        ])
    }

    pub fn with_children(children: Vec<Box<dyn CoordinateTechnique>>) -> Self {
        Self::with_params(children, DEFAULT_C, DEFAULT_WINDOW_SIZE)
    }

    pub fn with_params(
        children: Vec<Box<dyn CoordinateTechnique>>,
        c: f64,
        window_size: usize,
    ) -> Self {
        assert!(!children.is_empty(), "bandit needs at least one child");
        let n = children.len();
        Self {
            c,
            window_size,
            children,
            current: 0,
            best_cost: f64::MAX,
            history: VecDeque::new(),
            uses: vec![0; n],
            raw_auc: vec![0; n],
            decay: vec![0; n],
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// In-window use counts per child, for diagnostics.
    pub fn uses(&self) -> &[usize] {
        &self.uses
    }

    fn auc(&self, technique: usize) -> f64 {
        let uses = self.uses[technique];
        if uses > 0 {
            self.raw_auc[technique] as f64 * 2.0 / (uses as f64 * (uses as f64 + 1.0))
        } else {
            0.0
        }
    }

    fn exploration_value(&self, technique: usize) -> f64 {
        if self.uses[technique] > 0 {
            (2.0 * (self.history.len() as f64).log2() / self.uses[technique] as f64).sqrt()
        } else {
            f64::INFINITY
        }
    }

    fn score(&self, technique: usize) -> f64 {
        self.auc(technique) + self.c * self.exploration_value(technique)
    }

    /// Argmax over child scores; ties break uniformly by shuffling the
    /// candidate order first.
    fn best_technique(&mut self) -> usize {
        let mut indices: Vec<usize> = (0..self.children.len()).collect();
        indices.shuffle(&mut self.rng);
        indices
            .into_iter()
            .max_by(|&a, &b| self.score(a).total_cmp(&self.score(b)))
            .expect("at least one child")
    }

    fn history_push(&mut self, technique: usize, cost_improved: bool) {
        if self.history.len() == self.window_size {
            let oldest = self.history.pop_front().expect("window is full");
            self.uses[oldest.technique_index] -= 1;
            self.raw_auc[oldest.technique_index] -= self.decay[oldest.technique_index];
            if oldest.cost_improved {
                self.decay[oldest.technique_index] -= 1;
            }
        }

        self.uses[technique] += 1;
        if cost_improved {
            self.raw_auc[technique] += self.uses[technique];
            self.decay[technique] += 1;
        }
        self.history.push_back(HistoryEntry {
            technique_index: technique,
            cost_improved,
        });
    }
}

impl Default for AucBandit {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateTechnique for AucBandit {
    fn initialize(&mut self, dimensionality: usize) {
        for child in &mut self.children {
            child.initialize(dimensionality);
        }
    }

    fn next_coordinates(&mut self) -> Vec<Coordinates> {
        self.current = self.best_technique();
        debug!(
            technique = self.children[self.current].name(),
            index = self.current,
            "bandit selected child technique"
        );
        self.children[self.current].next_coordinates()
    }

    fn report_costs(&mut self, costs: &[(Coordinates, Cost)]) {
        self.children[self.current].report_costs(costs);

        let min_cost = costs
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::MAX, f64::min);
        let cost_improved = min_cost < self.best_cost;
        if cost_improved {
            self.best_cost = min_cost;
        }
        let current = self.current;
        self.history_push(current, cost_improved);
    }

    fn finalize(&mut self) {
        for child in &mut self.children {
            child.finalize();
        }
    }

    fn name(&self) -> &'static str {
        "auc_bandit"
    }
}
