//! # at-engine
//!
//! The exploration engine and user-facing facade of the atune auto-tuner.
//!
//! [`Tuner`] wires declared parameter groups, a search technique, and a cost
//! function into a tuning run, either as one blocking loop (`tune`) or in
//! stepping mode where the host drives one configuration at a time
//! (`get_configuration` / `report_cost`).  Runs are recorded in a
//! semicolon-separated CSV log and summarized in a
//! [`TuningStatus`](at_types::TuningStatus).

pub mod abort;
mod cost;
mod engine;
mod log;
mod tuner;

pub use cost::CostFunction;
pub use engine::{ExplorationEngine, Technique};
pub use log::{default_log_file, timestamp_str, EvaluationTiming, TuningLog};
pub use tuner::Tuner;
