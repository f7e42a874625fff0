//! Tagged parameter values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::errors::{TunerError, TunerResult};

/// A single tuning-parameter value.
///
/// Ordering is defined within a variant only; comparing values of different
/// variants yields `None`.  Use the narrowing accessors for explicit numeric
/// conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Size(u64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl Value {
    /// Variant name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Size(_) => "size",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
        }
    }

    pub fn to_bool(&self) -> TunerResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(i) => Ok(*i != 0),
            Self::Size(s) => Ok(*s != 0),
            other => Err(narrowing(other, "bool")),
        }
    }

    pub fn to_i64(&self) -> TunerResult<i64> {
        match self {
            Self::Bool(b) => Ok(*b as i64),
            Self::Int(i) => Ok(*i),
            Self::Size(s) => i64::try_from(*s).map_err(|_| narrowing(self, "i64")),
            Self::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            Self::Double(d) if d.fract() == 0.0 && d.abs() < 2f64.powi(63) => Ok(*d as i64),
            other => Err(narrowing(other, "i64")),
        }
    }

    pub fn to_u64(&self) -> TunerResult<u64> {
        match self {
            Self::Bool(b) => Ok(*b as u64),
            Self::Int(i) => u64::try_from(*i).map_err(|_| narrowing(self, "u64")),
            Self::Size(s) => Ok(*s),
            Self::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(*f as u64),
            Self::Double(d) if d.fract() == 0.0 && *d >= 0.0 && *d < 2f64.powi(64) => {
                Ok(*d as u64)
            }
            other => Err(narrowing(other, "u64")),
        }
    }

    pub fn to_f32(&self) -> TunerResult<f32> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(i) if (*i as f32) as i64 == *i => Ok(*i as f32),
            Self::Size(s) if (*s as f32) as u64 == *s => Ok(*s as f32),
            Self::Double(d) if (*d as f32) as f64 == *d => Ok(*d as f32),
            other => Err(narrowing(other, "f32")),
        }
    }

    pub fn to_f64(&self) -> TunerResult<f64> {
        match self {
            Self::Float(f) => Ok(*f as f64),
            Self::Double(d) => Ok(*d),
            Self::Int(i) if (*i as f64) as i64 == *i => Ok(*i as f64),
            Self::Size(s) if (*s as f64) as u64 == *s => Ok(*s as f64),
            other => Err(narrowing(other, "f64")),
        }
    }

    pub fn as_str(&self) -> TunerResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(narrowing(other, "string")),
        }
    }
}

fn narrowing(value: &Value, target: &str) -> TunerError {
    TunerError::Narrowing(format!(
        "cannot represent {value} ({}) losslessly as {target}",
        value.type_name()
    ))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Size(a), Self::Size(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Size(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Size(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}
