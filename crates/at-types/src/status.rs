//! Tuning-run bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Configuration;

/// Sentinel cost marking a failed configuration.  Techniques treat it as the
/// worst possible value.
pub const INVALID_COST: f64 = f64::MAX;

/// Whether `cost` is the failure sentinel.
pub fn is_invalid_cost(cost: f64) -> bool {
    cost >= INVALID_COST
}

/// One best-so-far record: when it was found, what it was, what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub configuration: Configuration,
    pub cost: f64,
}

/// Unique tuning-run identifier.
pub type RunId = Uuid;

/// Aggregate status of a tuning run.
///
/// The history holds only strict improvements of the minimum cost, headed by
/// a sentinel entry (empty configuration, [`INVALID_COST`]) stamped with the
/// run's start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningStatus {
    run_id: RunId,
    history: Vec<HistoryEntry>,
    evaluated_configs: usize,
    invalid_configs: usize,
    evaluations_to_best: usize,
    valid_evaluations_to_best: usize,
}

impl TuningStatus {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            history: vec![HistoryEntry {
                timestamp: Utc::now(),
                configuration: Configuration::new(),
                cost: INVALID_COST,
            }],
            evaluated_configs: 0,
            invalid_configs: 0,
            evaluations_to_best: 0,
            valid_evaluations_to_best: 0,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn tuning_start_time(&self) -> DateTime<Utc> {
        self.history[0].timestamp
    }

    /// Cheapest cost seen so far ([`INVALID_COST`] before the first valid
    /// evaluation).
    pub fn min_cost(&self) -> f64 {
        self.history.last().expect("sentinel entry").cost
    }

    pub fn best_configuration(&self) -> &Configuration {
        &self.history.last().expect("sentinel entry").configuration
    }

    pub fn evaluated_configs(&self) -> usize {
        self.evaluated_configs
    }

    pub fn invalid_configs(&self) -> usize {
        self.invalid_configs
    }

    pub fn valid_configs(&self) -> usize {
        self.evaluated_configs - self.invalid_configs
    }

    pub fn evaluations_required_to_find_best(&self) -> usize {
        self.evaluations_to_best
    }

    pub fn valid_evaluations_required_to_find_best(&self) -> usize {
        self.valid_evaluations_to_best
    }

    /// Full history including the sentinel head.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Improvement entries only (sentinel skipped).
    pub fn improvements(&self) -> &[HistoryEntry] {
        &self.history[1..]
    }

    /// Count one evaluated configuration.
    pub fn record_evaluated(&mut self) {
        self.evaluated_configs += 1;
    }

    /// Count one failed configuration.
    pub fn record_invalid(&mut self) {
        self.invalid_configs += 1;
    }

    /// Append a history entry for a configuration that strictly improved the
    /// minimum cost.  The caller checks the improvement.
    pub fn record_improvement(&mut self, configuration: Configuration, cost: f64) {
        debug_assert!(cost < self.min_cost(), "not an improvement");
        self.evaluations_to_best = self.evaluated_configs;
        self.valid_evaluations_to_best = self.valid_configs();
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            configuration,
            cost,
        });
    }
}

impl Default for TuningStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn config(cost_tag: i64) -> Configuration {
        let mut c = Configuration::new();
        c.push("x", Value::Int(cost_tag));
        c
    }

    #[test]
    fn starts_with_sentinel() {
        let status = TuningStatus::new();
        assert_eq!(status.min_cost(), INVALID_COST);
        assert!(status.best_configuration().is_empty());
        assert_eq!(status.improvements().len(), 0);
        assert_eq!(status.history().len(), 1);
    }

    #[test]
    fn improvement_sequence() {
        let mut status = TuningStatus::new();
        for cost in [5.0, 9.0, 3.0, 4.0, 2.0] {
            status.record_evaluated();
            if cost < status.min_cost() {
                status.record_improvement(config(cost as i64), cost);
            }
        }
        let costs: Vec<f64> = status.improvements().iter().map(|e| e.cost).collect();
        assert_eq!(costs, vec![5.0, 3.0, 2.0]);
        assert_eq!(status.min_cost(), 2.0);
        assert_eq!(status.evaluations_required_to_find_best(), 5);
        assert_eq!(status.best_configuration().get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn invalid_counts_separately() {
        let mut status = TuningStatus::new();
        status.record_evaluated();
        status.record_invalid();
        status.record_evaluated();
        assert_eq!(status.evaluated_configs(), 2);
        assert_eq!(status.invalid_configs(), 1);
        assert_eq!(status.valid_configs(), 1);
    }

    #[test]
    fn invalid_cost_sentinel() {
        assert!(is_invalid_cost(INVALID_COST));
        assert!(is_invalid_cost(f64::INFINITY));
        assert!(!is_invalid_cost(1e300));
    }
}
