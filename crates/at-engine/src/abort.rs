//! Abort conditions: predicates over the tuning status that tell the engine
//! when to stop.

use std::time::Duration as StdDuration;

use at_types::{is_invalid_cost, TuningStatus};
use tracing::debug;

/// Decides whether a tuning run should stop, based on its current status.
///
/// `stop` takes `&mut self` because some conditions track their own history
/// across polls (see [`SpeedupPlateau`]).
pub trait AbortCondition {
    fn stop(&mut self, status: &TuningStatus) -> bool;
}

/// Stop after `N` evaluated configurations, valid or not.
#[derive(Debug, Clone, Copy)]
pub struct Evaluations(pub usize);

impl AbortCondition for Evaluations {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        status.evaluated_configs() >= self.0
    }
}

/// Stop after `N` valid evaluations.
#[derive(Debug, Clone, Copy)]
pub struct ValidEvaluations(pub usize);

impl AbortCondition for ValidEvaluations {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        status.valid_configs() >= self.0
    }
}

/// Stop once the wall clock since the run started exceeds the limit.
#[derive(Debug, Clone, Copy)]
pub struct Duration(pub StdDuration);

impl AbortCondition for Duration {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        let elapsed = (chrono::Utc::now() - status.tuning_start_time())
            .to_std()
            .unwrap_or_default();
        elapsed > self.0
    }
}

/// Stop once the minimum cost reaches the target.
#[derive(Debug, Clone, Copy)]
pub struct TargetCost(pub f64);

impl AbortCondition for TargetCost {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        status.min_cost() <= self.0
    }
}

/// Stop when improvement plateaus: the ratio of the minimum cost `window`
/// evaluations ago to the current minimum cost drops to `factor` or below.
///
/// With `valid_only` set, polls where no valid result exists yet are not
/// recorded, so the window spans valid observations only.
#[derive(Debug, Clone)]
pub struct SpeedupPlateau {
    factor: f64,
    window: usize,
    valid_only: bool,
    observed: Vec<f64>,
}

impl SpeedupPlateau {
    pub fn new(factor: f64, window: usize) -> Self {
        Self {
            factor,
            window,
            valid_only: true,
            observed: Vec::new(),
        }
    }

    pub fn include_invalid(mut self) -> Self {
        self.valid_only = false;
        self
    }
}

impl AbortCondition for SpeedupPlateau {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        if !(self.valid_only && is_invalid_cost(status.min_cost())) {
            self.observed.push(status.min_cost());
        }
        if self.observed.len() < self.window {
            return false;
        }
        let reference = self.observed[self.observed.len() - self.window];
        let current = *self.observed.last().expect("window is non-empty");
        let speedup = reference / current;
        debug!(reference, current, speedup, "speedup plateau check");
        speedup <= self.factor
    }
}

/// Stops when every inner condition wants to stop.
pub struct And(Vec<Box<dyn AbortCondition>>);

impl And {
    pub fn new(conditions: Vec<Box<dyn AbortCondition>>) -> Self {
        assert!(!conditions.is_empty(), "And needs at least one condition");
        Self(conditions)
    }
}

impl AbortCondition for And {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        self.0.iter_mut().all(|c| c.stop(status))
    }
}

/// Stops when any inner condition wants to stop.
pub struct Or(Vec<Box<dyn AbortCondition>>);

impl Or {
    pub fn new(conditions: Vec<Box<dyn AbortCondition>>) -> Self {
        assert!(!conditions.is_empty(), "Or needs at least one condition");
        Self(conditions)
    }
}

impl AbortCondition for Or {
    fn stop(&mut self, status: &TuningStatus) -> bool {
        self.0.iter_mut().any(|c| c.stop(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_types::{Configuration, INVALID_COST};

    fn status_with(evaluated: usize, invalid: usize, costs: &[f64]) -> TuningStatus {
        let mut status = TuningStatus::new();
        for _ in 0..evaluated {
            status.record_evaluated();
        }
        for _ in 0..invalid {
            status.record_invalid();
        }
        for &cost in costs {
            if cost < status.min_cost() {
                status.record_improvement(Configuration::new(), cost);
            }
        }
        status
    }

    #[test]
    fn evaluations_threshold() {
        let mut cond = Evaluations(5);
        assert!(!cond.stop(&status_with(4, 0, &[])));
        assert!(cond.stop(&status_with(5, 0, &[])));
        assert!(cond.stop(&status_with(6, 0, &[])));
    }

    #[test]
    fn valid_evaluations_ignore_invalid() {
        let mut cond = ValidEvaluations(3);
        // 5 evaluated, 3 invalid -> only 2 valid
        assert!(!cond.stop(&status_with(5, 3, &[])));
        assert!(cond.stop(&status_with(5, 2, &[])));
    }

    #[test]
    fn target_cost_reached() {
        let mut cond = TargetCost(10.0);
        assert!(!cond.stop(&status_with(1, 0, &[25.0])));
        assert!(cond.stop(&status_with(2, 0, &[25.0, 9.0])));
    }

    #[test]
    fn and_requires_all() {
        let status = status_with(10, 0, &[1.0]);
        let mut both = And::new(vec![
            Box::new(Evaluations(5)),
            Box::new(TargetCost(5.0)),
        ]);
        assert!(both.stop(&status));

        let mut one_short = And::new(vec![
            Box::new(Evaluations(50)),
            Box::new(TargetCost(5.0)),
        ]);
        assert!(!one_short.stop(&status));
    }

    #[test]
    fn or_requires_any() {
        let status = status_with(10, 0, &[100.0]);
        let mut either = Or::new(vec![
            Box::new(Evaluations(50)),
            Box::new(TargetCost(200.0)),
        ]);
        assert!(either.stop(&status));

        let mut neither = Or::new(vec![
            Box::new(Evaluations(50)),
            Box::new(TargetCost(5.0)),
        ]);
        assert!(!neither.stop(&status));
    }

    #[test]
    fn plateau_stops_when_improvement_stalls() {
        let mut cond = SpeedupPlateau::new(1.0, 3);
        let stalled = status_with(1, 0, &[50.0]);
        assert!(!cond.stop(&stalled)); // 1 observation
        assert!(!cond.stop(&stalled)); // 2 observations
        assert!(cond.stop(&stalled)); // 50/50 = 1.0 <= factor
    }

    #[test]
    fn plateau_keeps_running_while_improving() {
        let mut cond = SpeedupPlateau::new(1.5, 2);
        assert!(!cond.stop(&status_with(1, 0, &[100.0])));
        // 100 / 10 = 10 > 1.5: still improving fast enough
        assert!(!cond.stop(&status_with(2, 0, &[100.0, 10.0])));
    }

    #[test]
    fn plateau_skips_polls_without_valid_results() {
        let mut cond = SpeedupPlateau::new(1.0, 2);
        let no_valid = status_with(3, 3, &[]);
        assert!(!cond.stop(&no_valid));
        assert!(!cond.stop(&no_valid));
        assert!(cond.observed.is_empty());
        assert_eq!(no_valid.min_cost(), INVALID_COST);
    }
}
