//! User-facing tuner facade.

use std::path::PathBuf;
use std::time::Instant;

use at_search::{CoordinateTechnique, IndexTechnique};
use at_types::{
    is_invalid_cost, Configuration, Group, TunerError, TunerResult, TuningStatus, INVALID_COST,
};
use chrono::Local;
use tracing::info;

use crate::abort::AbortCondition;
use crate::cost::CostFunction;
use crate::engine::{ExplorationEngine, Technique};
use crate::log::{default_log_file, EvaluationTiming, TuningLog};

/// Online-mode state: engine, open log, and the get/report alternation.
struct Stepping {
    engine: ExplorationEngine,
    log: TuningLog,
    expects_report: bool,
    current_config: Option<Configuration>,
    started: Instant,
}

/// Chainable builder and driver for a tuning run.
///
/// Two modes are supported.  Batch mode runs the whole loop:
///
/// ```no_run
/// # use at_engine::Tuner;
/// # use at_types::{Configuration, Range, TunerResult, TuningParameter};
/// let status = Tuner::new()
///     .tuning_parameters(vec![TuningParameter::new("cache", Range::interval(1, 64))])
///     .tune(|config: &Configuration| -> TunerResult<f64> {
///         Ok(config.get("cache").unwrap().to_f64()?)
///     })?;
/// # Ok::<(), at_types::TunerError>(())
/// ```
///
/// Stepping mode hands control of the loop to the host:
/// [`get_configuration`](Tuner::get_configuration) and
/// [`report_cost`](Tuner::report_cost) must alternate strictly, and the host
/// decides when to stop.
pub struct Tuner {
    groups: Vec<Group>,
    technique: Option<Technique>,
    abort_on_error: bool,
    silent: bool,
    log_file: Option<PathBuf>,
    stepping: Option<Stepping>,
}

impl Tuner {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            technique: None,
            abort_on_error: false,
            silent: false,
            log_file: None,
            stepping: None,
        }
    }

    /// Register one group of tuning parameters.  Each call declares an
    /// independent group whose joint space is enumerated as one tree.
    pub fn tuning_parameters(mut self, group: impl Into<Group>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Choose a coordinate-space search technique.
    pub fn search_technique(mut self, technique: impl CoordinateTechnique + 'static) -> Self {
        self.technique = Some(Technique::Coordinate(Box::new(technique)));
        self
    }

    /// Choose an index-space search technique.
    pub fn search_technique_index(mut self, technique: impl IndexTechnique + 'static) -> Self {
        self.technique = Some(Technique::Index(Box::new(technique)));
        self
    }

    /// Suppress progress logging.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Where to write the CSV tuning log; defaults to
    /// `tuning_log_<start timestamp>.csv`.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Abort the whole run when the cost function fails, instead of
    /// recording the configuration as invalid and continuing.
    pub fn abort_on_error(mut self) -> Self {
        self.abort_on_error = true;
        self
    }

    /// Run a batch tuning loop with the engine's default abort condition
    /// (one pass over the whole space).
    pub fn tune<C: CostFunction>(&mut self, mut cost_fn: C) -> TunerResult<TuningStatus> {
        let mut engine = self.build_engine()?;
        engine.tune(&mut cost_fn)
    }

    /// Run a batch tuning loop until `abort` triggers.
    pub fn tune_with<C: CostFunction>(
        &mut self,
        mut cost_fn: C,
        abort: impl AbortCondition + 'static,
    ) -> TunerResult<TuningStatus> {
        let mut engine = self.build_engine()?;
        engine.set_abort_condition(Box::new(abort));
        engine.tune(&mut cost_fn)
    }

    /// Stepping mode: the next configuration to measure.
    ///
    /// The first call generates the search space, initializes the technique,
    /// and opens the log.  Every call must be followed by a matching
    /// [`report_cost`](Tuner::report_cost) before the next one.
    pub fn get_configuration(&mut self) -> TunerResult<Configuration> {
        if self.stepping.is_none() {
            let mut engine = self.build_engine()?;
            engine.ensure_technique();
            engine.initialize_technique();

            let path = self
                .log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(default_log_file(Local::now())));
            let log = TuningLog::create(&path, engine.space().names(), false)?;

            if !self.silent {
                info!(
                    search_space_size = %engine.space().num_configs(),
                    "entering stepping mode"
                );
            }
            self.stepping = Some(Stepping {
                engine,
                log,
                expects_report: false,
                current_config: None,
                started: Instant::now(),
            });
        }

        let stepping = self.stepping.as_mut().expect("stepping initialized above");
        if stepping.expects_report {
            return Err(TunerError::Protocol("call to report_cost() expected".into()));
        }

        let configuration = stepping.engine.next_config()?;
        stepping.engine.status_mut().record_evaluated();
        stepping.expects_report = true;
        stepping.current_config = Some(configuration.clone());
        Ok(configuration)
    }

    /// Stepping mode: deliver the measured cost for the configuration
    /// returned by the previous [`get_configuration`](Tuner::get_configuration).
    pub fn report_cost(&mut self, cost: f64) -> TunerResult<()> {
        let silent = self.silent;
        let stepping = self
            .stepping
            .as_mut()
            .ok_or_else(|| TunerError::Protocol("no tuning in progress".into()))?;
        if !stepping.expects_report {
            return Err(TunerError::Protocol(
                "call to get_configuration() expected".into(),
            ));
        }

        let configuration = stepping
            .current_config
            .clone()
            .expect("a configuration is in flight");
        stepping.engine.report_result(cost);
        stepping.expects_report = false;

        if is_invalid_cost(cost) {
            stepping.engine.status_mut().record_invalid();
        }
        if cost < stepping.engine.status().min_cost() {
            stepping
                .engine
                .status_mut()
                .record_improvement(configuration.clone(), cost);
        }

        stepping
            .log
            .append(cost, &configuration, EvaluationTiming::default())?;

        if !silent {
            info!(
                evaluated = stepping.engine.status().evaluated_configs(),
                cost,
                min_cost = stepping.engine.status().min_cost(),
                "reported cost"
            );
        }
        Ok(())
    }

    /// Stepping mode: one get/measure/report cycle.  A failing cost function
    /// is reported as [`INVALID_COST`] and does not end the run.
    pub fn make_step<C: CostFunction>(&mut self, cost_fn: &mut C) -> TunerResult<f64> {
        let configuration = self.get_configuration()?;
        let cost = match cost_fn.evaluate(&configuration) {
            Ok(cost) => cost,
            Err(_) => INVALID_COST,
        };
        self.report_cost(cost)?;
        Ok(cost)
    }

    /// Current status of the stepping run.
    pub fn tuning_status(&self) -> TunerResult<&TuningStatus> {
        match &self.stepping {
            Some(stepping) => Ok(stepping.engine.status()),
            None => Err(TunerError::Protocol("no tuning in progress".into())),
        }
    }

    /// End a stepping run: finalize the technique, close the log, and return
    /// the final status.
    pub fn finish(&mut self) -> TunerResult<TuningStatus> {
        let mut stepping = self
            .stepping
            .take()
            .ok_or_else(|| TunerError::Protocol("no tuning in progress".into()))?;
        stepping.engine.finalize_technique();
        let status = stepping.engine.status().clone();
        stepping.log.close()?;
        if !self.silent {
            info!(
                evaluated = status.evaluated_configs(),
                evaluations_to_best = status.evaluations_required_to_find_best(),
                runtime_secs = stepping.started.elapsed().as_secs(),
                "tuning finished"
            );
        }
        Ok(status)
    }

    fn build_engine(&mut self) -> TunerResult<ExplorationEngine> {
        if self.stepping.is_some() {
            return Err(TunerError::Protocol(
                "cannot start tuning while stepping is in progress".into(),
            ));
        }
        let space = at_space::generate(&self.groups)?;
        let mut engine = ExplorationEngine::new(space);
        if let Some(technique) = self.technique.take() {
            engine.set_technique(technique);
        }
        engine.set_abort_on_error(self.abort_on_error);
        engine.set_silent(self.silent);
        engine.set_log_file(self.log_file.clone());
        Ok(engine)
    }
}

impl Default for Tuner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Tuner {
    fn drop(&mut self) {
        if self.stepping.is_some() {
            let _ = self.finish();
        }
    }
}
