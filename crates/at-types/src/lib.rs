//! # at-types
//!
//! Core domain types for the atune auto-tuner: tagged parameter values,
//! arbitrary-precision search-space sizes, candidate ranges, tuning
//! parameters with admissibility predicates, configurations, and
//! tuning-status bookkeeping.

mod bigint;
mod config;
mod errors;
mod param;
mod range;
mod status;
mod value;

pub use bigint::BigInt;
pub use config::Configuration;
pub use errors::{TunerError, TunerResult};
pub use param::{
    and, divides, equal, greater_than, greater_than_or_eq, less_than, less_than_or_eq,
    multiple_of, or, unequal, Bindings, Group, Predicate, TuningParameter,
};
pub use range::{pow_2, Generator, Range, RangeIter, RangeKind};
pub use status::{is_invalid_cost, HistoryEntry, RunId, TuningStatus, INVALID_COST};
pub use value::Value;
