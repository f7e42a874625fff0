//! The exploration engine: drives a search technique over a search space
//! against a cost function.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use at_search::{CoordinateTechnique, Coordinates, Exhaustive, IndexTechnique};
use at_space::SearchSpace;
use at_types::{
    is_invalid_cost, BigInt, Configuration, TunerError, TunerResult, TuningStatus, INVALID_COST,
};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::abort::{AbortCondition, Evaluations};
use crate::cost::CostFunction;
use crate::log::{default_log_file, EvaluationTiming, TuningLog};

/// The one technique driving a run; coordinate-form and index-form are
/// mutually exclusive.
pub enum Technique {
    Coordinate(Box<dyn CoordinateTechnique>),
    Index(Box<dyn IndexTechnique>),
}

/// Owns the search space, the technique, the abort condition, and the status
/// bookkeeping of one tuning run.
///
/// Proposals are consumed one at a time: a technique's batch is buffered,
/// each member is translated to a configuration and costed in proposal
/// order, and the complete cost map goes back to the technique only when the
/// batch is drained.
pub struct ExplorationEngine {
    space: SearchSpace,
    technique: Option<Technique>,
    abort: Option<Box<dyn AbortCondition>>,
    abort_on_error: bool,
    silent: bool,
    log_file: Option<PathBuf>,
    status: TuningStatus,

    pending_coordinates: VecDeque<Coordinates>,
    coordinate_costs: Vec<(Coordinates, f64)>,
    pending_indices: VecDeque<BigInt>,
    index_costs: Vec<(BigInt, f64)>,
}

impl ExplorationEngine {
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            technique: None,
            abort: None,
            abort_on_error: false,
            silent: false,
            log_file: None,
            status: TuningStatus::new(),
            pending_coordinates: VecDeque::new(),
            coordinate_costs: Vec::new(),
            pending_indices: VecDeque::new(),
            index_costs: Vec::new(),
        }
    }

    pub fn set_technique(&mut self, technique: Technique) {
        self.technique = Some(technique);
    }

    pub fn set_abort_condition(&mut self, condition: Box<dyn AbortCondition>) {
        self.abort = Some(condition);
    }

    pub fn set_abort_on_error(&mut self, abort_on_error: bool) {
        self.abort_on_error = abort_on_error;
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn set_log_file(&mut self, path: Option<PathBuf>) {
        self.log_file = path;
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn status(&self) -> &TuningStatus {
        &self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut TuningStatus {
        &mut self.status
    }

    /// Run the blocking tuning loop until the abort condition triggers.
    ///
    /// Falls back to exhaustive index enumeration when no technique was
    /// chosen, and to `Evaluations(|S|)` when no abort condition was set.
    pub fn tune<C: CostFunction>(&mut self, cost_fn: &mut C) -> TunerResult<TuningStatus> {
        if self.is_stepping() {
            return Err(TunerError::Protocol(
                "cannot start a batch run with a batch in flight".into(),
            ));
        }
        self.ensure_technique();
        if self.abort.is_none() {
            let evaluations = self
                .space
                .num_configs()
                .to_usize()
                .unwrap_or(usize::MAX);
            self.abort = Some(Box::new(Evaluations(evaluations)));
        }

        if !self.silent {
            info!(
                run_id = %self.status.run_id(),
                search_space_size = %self.space.num_configs(),
                "starting tuning run"
            );
        }

        let log_path = self
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_log_file(Local::now())));
        let mut log = TuningLog::create(&log_path, self.space.names(), true)?;

        self.initialize_technique();
        let outcome = self.tune_loop(cost_fn, &mut log);
        self.finalize_technique();
        let closed = log.close();

        outcome?;
        closed?;

        if !self.silent {
            info!(
                evaluated = self.status.evaluated_configs(),
                invalid = self.status.invalid_configs(),
                min_cost = self.status.min_cost(),
                evaluations_to_best = self.status.evaluations_required_to_find_best(),
                "tuning finished"
            );
        }
        Ok(self.status.clone())
    }

    fn tune_loop<C: CostFunction>(
        &mut self,
        cost_fn: &mut C,
        log: &mut TuningLog,
    ) -> TunerResult<()> {
        loop {
            if self
                .abort
                .as_mut()
                .expect("abort condition defaulted above")
                .stop(&self.status)
            {
                return Ok(());
            }

            let proposal_start = Instant::now();
            let configuration = self.next_config()?;
            let get_next_config_ms = proposal_start.elapsed().as_millis();

            let cost_start = Instant::now();
            let outcome = cost_fn.evaluate(&configuration);
            let cost_function_ms = cost_start.elapsed().as_millis();

            let (cost, failure) = match outcome {
                Ok(cost) if !is_invalid_cost(cost) => (cost, None),
                Ok(_) => (INVALID_COST, Some("cost function returned the sentinel".to_string())),
                Err(err) => (INVALID_COST, Some(err.to_string())),
            };

            if let Some(reason) = &failure {
                self.status.record_invalid();
                warn!(%configuration, %reason, "configuration failed");
            }
            self.status.record_evaluated();
            if cost < self.status.min_cost() {
                self.status
                    .record_improvement(configuration.clone(), cost);
            }

            let report_start = Instant::now();
            self.report_result(cost);
            let report_cost_ms = report_start.elapsed().as_millis();

            log.append(
                cost,
                &configuration,
                EvaluationTiming {
                    get_next_config_ms,
                    cost_function_ms,
                    report_cost_ms,
                },
            )?;

            if !self.silent {
                debug!(
                    evaluated = self.status.evaluated_configs(),
                    cost,
                    min_cost = self.status.min_cost(),
                    "evaluated configuration"
                );
            }

            if failure.is_some() && self.abort_on_error {
                return Err(TunerError::InvalidConfig(
                    failure.expect("failure reason recorded"),
                ));
            }
        }
    }

    /// Whether a proposal batch is partially consumed.
    fn is_stepping(&self) -> bool {
        !self.pending_coordinates.is_empty() || !self.pending_indices.is_empty()
    }

    pub(crate) fn ensure_technique(&mut self) {
        if self.technique.is_none() {
            info!("no search technique selected, defaulting to exhaustive enumeration");
            self.technique = Some(Technique::Index(Box::new(Exhaustive::new())));
        }
    }

    pub(crate) fn initialize_technique(&mut self) {
        match self.technique.as_mut().expect("technique ensured") {
            Technique::Coordinate(t) => t.initialize(self.space.num_params()),
            Technique::Index(t) => t.initialize(self.space.num_configs()),
        }
    }

    pub(crate) fn finalize_technique(&mut self) {
        match self.technique.as_mut() {
            Some(Technique::Coordinate(t)) => t.finalize(),
            Some(Technique::Index(t)) => t.finalize(),
            None => {}
        }
    }

    /// Translate the next pending proposal into a configuration, requesting a
    /// fresh batch from the technique when the buffer is empty.  The proposal
    /// stays buffered until its cost arrives via [`report_result`].
    ///
    /// [`report_result`]: ExplorationEngine::report_result
    pub(crate) fn next_config(&mut self) -> TunerResult<Configuration> {
        match self.technique.as_mut() {
            Some(Technique::Coordinate(t)) => {
                if self.pending_coordinates.is_empty() {
                    let batch = t.next_coordinates();
                    if batch.is_empty() {
                        return Err(TunerError::Internal(
                            "search technique proposed an empty batch".into(),
                        ));
                    }
                    self.pending_coordinates.extend(batch);
                }
                let coordinates = self
                    .pending_coordinates
                    .front()
                    .expect("batch is non-empty");
                self.space.get_by_coordinates(coordinates)
            }
            Some(Technique::Index(t)) => {
                if self.pending_indices.is_empty() {
                    let batch = t.next_indices();
                    if batch.is_empty() {
                        return Err(TunerError::Internal(
                            "search technique proposed an empty batch".into(),
                        ));
                    }
                    self.pending_indices.extend(batch);
                }
                let index = self.pending_indices.front().expect("batch is non-empty");
                self.space.get_by_index(index)
            }
            None => Err(TunerError::Protocol("no search technique selected".into())),
        }
    }

    /// Record the cost for the proposal returned by the last
    /// [`next_config`]; hands the accumulated cost map to the technique once
    /// the batch is drained.
    ///
    /// [`next_config`]: ExplorationEngine::next_config
    pub(crate) fn report_result(&mut self, cost: f64) {
        match self.technique.as_mut() {
            Some(Technique::Coordinate(t)) => {
                let proposal = self
                    .pending_coordinates
                    .pop_front()
                    .expect("a proposal is in flight");
                self.coordinate_costs.push((proposal, cost));
                if self.pending_coordinates.is_empty() {
                    t.report_costs(&self.coordinate_costs);
                    self.coordinate_costs.clear();
                }
            }
            Some(Technique::Index(t)) => {
                let proposal = self
                    .pending_indices
                    .pop_front()
                    .expect("a proposal is in flight");
                self.index_costs.push((proposal, cost));
                if self.pending_indices.is_empty() {
                    t.report_costs(&self.index_costs);
                    self.index_costs.clear();
                }
            }
            None => unreachable!("report_result without a technique"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::{And, Duration as DurationCond, TargetCost};
    use at_search::SimulatedAnnealing;
    use at_types::{Group, Range, TuningParameter, Value};
    use std::time::Duration as StdDuration;

    fn flat_space(n: i64) -> SearchSpace {
        let x = TuningParameter::new("x", Range::interval(1, n));
        at_space::generate(&[Group::of(vec![x])]).unwrap()
    }

    fn tempdir_log(engine: &mut ExplorationEngine, dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("run.csv");
        engine.set_log_file(Some(path.clone()));
        path
    }

    #[test]
    fn exhaustive_visits_the_flat_space_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(4));
        tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(Evaluations(4)));

        let mut visited = Vec::new();
        let mut cf = |config: &Configuration| {
            let x = config.get("x").unwrap().to_i64().unwrap();
            visited.push(x);
            Ok(x as f64)
        };
        let status = engine.tune(&mut cf).unwrap();

        assert_eq!(visited, vec![1, 2, 3, 4]);
        assert_eq!(status.evaluated_configs(), 4);
        assert_eq!(status.min_cost(), 1.0);
        assert_eq!(
            status.best_configuration().get("x"),
            Some(&Value::Int(1))
        );
    }

    #[test]
    fn defaults_to_exhaustive_over_the_whole_space() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(6));
        tempdir_log(&mut engine, &dir);

        let mut cf = |config: &Configuration| {
            Ok(config.get("x").unwrap().to_f64().unwrap())
        };
        let status = engine.tune(&mut cf).unwrap();
        assert_eq!(status.evaluated_configs(), 6);
    }

    #[test]
    fn history_records_strict_improvements_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(5));
        tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(Evaluations(5)));

        let costs = [5.0, 9.0, 3.0, 4.0, 2.0];
        let mut i = 0;
        let mut cf = |_: &Configuration| {
            let cost = costs[i];
            i += 1;
            Ok(cost)
        };
        let status = engine.tune(&mut cf).unwrap();
        let improvements: Vec<f64> =
            status.improvements().iter().map(|e| e.cost).collect();
        assert_eq!(improvements, vec![5.0, 3.0, 2.0]);
        assert_eq!(status.evaluations_required_to_find_best(), 5);
    }

    #[test]
    fn failed_cost_function_counts_as_invalid_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(4));
        tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(Evaluations(4)));

        let mut cf = |config: &Configuration| {
            let x = config.get("x").unwrap().to_i64().unwrap();
            if x % 2 == 0 {
                Err(TunerError::InvalidConfig("even values unsupported".into()))
            } else {
                Ok(x as f64)
            }
        };
        let status = engine.tune(&mut cf).unwrap();
        assert_eq!(status.evaluated_configs(), 4);
        assert_eq!(status.invalid_configs(), 2);
        assert_eq!(status.valid_configs(), 2);
        assert_eq!(status.min_cost(), 1.0);
    }

    #[test]
    fn abort_on_error_terminates_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(4));
        tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(Evaluations(4)));
        engine.set_abort_on_error(true);

        let mut cf = |config: &Configuration| {
            let x = config.get("x").unwrap().to_i64().unwrap();
            if x == 2 {
                Err(TunerError::InvalidConfig("boom".into()))
            } else {
                Ok(x as f64)
            }
        };
        let err = engine.tune(&mut cf).unwrap_err();
        assert!(matches!(err, TunerError::InvalidConfig(_)));
        assert_eq!(engine.status().evaluated_configs(), 2);
    }

    #[test]
    fn csv_rows_match_evaluated_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(5));
        let path = tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(Evaluations(5)));

        let mut cf = |config: &Configuration| {
            Ok(config.get("x").unwrap().to_f64().unwrap())
        };
        let status = engine.tune(&mut cf).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), status.evaluated_configs() + 1);
        // 2 fixed columns + 1 parameter + 3 timing columns
        assert_eq!(lines[0].split(';').count(), 6);
    }

    #[test]
    fn coordinate_technique_drives_the_space() {
        let dir = tempfile::tempdir().unwrap();
        let m = TuningParameter::new("m", Range::interval(1, 8));
        let n = TuningParameter::new("n", Range::interval(1, 8));
        let space = at_space::generate(&[Group::of(vec![m, n])]).unwrap();
        let mut engine = ExplorationEngine::new(space);
        tempdir_log(&mut engine, &dir);
        engine.set_technique(Technique::Coordinate(Box::new(
            SimulatedAnnealing::with_seed(5),
        )));
        engine.set_abort_condition(Box::new(Evaluations(50)));

        let mut cf = |config: &Configuration| {
            let m = config.get("m").unwrap().to_f64().unwrap();
            let n = config.get("n").unwrap().to_f64().unwrap();
            Ok((m - 4.0).abs() + (n - 6.0).abs())
        };
        let status = engine.tune(&mut cf).unwrap();
        assert_eq!(status.evaluated_configs(), 50);
        assert!(status.min_cost() < INVALID_COST);
    }

    #[test]
    fn composed_abort_condition_requires_both() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(8));
        tempdir_log(&mut engine, &dir);
        // target cost is met on the very first evaluation, but And also
        // demands at least 3 evaluations
        engine.set_abort_condition(Box::new(And::new(vec![
            Box::new(Evaluations(3)),
            Box::new(TargetCost(100.0)),
        ])));

        let mut cf = |_: &Configuration| Ok(1.0);
        let status = engine.tune(&mut cf).unwrap();
        assert_eq!(status.evaluated_configs(), 3);
    }

    #[test]
    fn duration_condition_is_wired() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ExplorationEngine::new(flat_space(3));
        tempdir_log(&mut engine, &dir);
        engine.set_abort_condition(Box::new(DurationCond(StdDuration::ZERO)));

        let mut cf = |_: &Configuration| Ok(1.0);
        let status = engine.tune(&mut cf).unwrap();
        // elapsed > 0 from the start-time sentinel, so nothing is evaluated
        assert_eq!(status.evaluated_configs(), 0);
    }
}
