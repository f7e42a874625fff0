//! Tuning parameters, admissibility predicates, and parameter groups.

use std::fmt;
use std::sync::Arc;

use crate::range::Range;
use crate::value::Value;

/// Ordered prefix of already-bound `(name, value)` pairs along the current
/// tree path.  Predicates read earlier parameters through it, which is what
/// makes inter-parameter constraints expressible.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    bound: &'a [(String, Value)],
}

impl<'a> Bindings<'a> {
    pub fn new(bound: &'a [(String, Value)]) -> Self {
        Self { bound }
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Value of an earlier parameter by name.
    pub fn value_of(&self, name: &str) -> Option<&'a Value> {
        self.bound
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Value of an earlier parameter by declaration position.
    pub fn at(&self, i: usize) -> Option<&'a Value> {
        self.bound.get(i).map(|(_, v)| v)
    }
}

/// Admissibility test: value under consideration plus the bound prefix.
pub type Predicate = Arc<dyn Fn(&Value, &Bindings) -> bool + Send + Sync>;

/// A named axis of the search space.
#[derive(Clone)]
pub struct TuningParameter {
    pub name: String,
    pub range: Range,
    pub predicate: Option<Predicate>,
}

impl TuningParameter {
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
            predicate: None,
        }
    }

    pub fn with_predicate(
        name: impl Into<String>,
        range: Range,
        predicate: Predicate,
    ) -> Self {
        Self {
            name: name.into(),
            range,
            predicate: Some(predicate),
        }
    }

    /// Whether `value` is admissible under the already-bound prefix.
    pub fn admits(&self, value: &Value, bindings: &Bindings) -> bool {
        match &self.predicate {
            Some(p) => p(value, bindings),
            None => true,
        }
    }
}

impl fmt::Debug for TuningParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuningParameter")
            .field("name", &self.name)
            .field("range", &self.range)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// An ordered set of parameters whose joint space is enumerated as one tree.
/// Different groups are independent.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub params: Vec<TuningParameter>,
}

impl Group {
    pub fn of(params: Vec<TuningParameter>) -> Self {
        Self { params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl From<Vec<TuningParameter>> for Group {
    fn from(params: Vec<TuningParameter>) -> Self {
        Self::of(params)
    }
}

// ---------------------------------------------------------------------------
// Shipped predicates
// ---------------------------------------------------------------------------

fn int_predicate(test: impl Fn(i64) -> bool + Send + Sync + 'static) -> Predicate {
    Arc::new(move |value, _| value.to_i64().map_or(false, &test))
}

/// Admits values that divide `m` evenly.
pub fn divides(m: i64) -> Predicate {
    int_predicate(move |i| i != 0 && (m / i) * i == m)
}

/// Admits multiples of `m`.
pub fn multiple_of(m: i64) -> Predicate {
    int_predicate(move |i| m != 0 && (i / m) * m == i)
}

pub fn less_than(m: i64) -> Predicate {
    int_predicate(move |i| i < m)
}

pub fn less_than_or_eq(m: i64) -> Predicate {
    int_predicate(move |i| i <= m)
}

pub fn greater_than(m: i64) -> Predicate {
    int_predicate(move |i| i > m)
}

pub fn greater_than_or_eq(m: i64) -> Predicate {
    int_predicate(move |i| i >= m)
}

pub fn equal(m: i64) -> Predicate {
    int_predicate(move |i| i == m)
}

pub fn unequal(m: i64) -> Predicate {
    int_predicate(move |i| i != m)
}

/// Short-circuit conjunction of two predicates.
pub fn and(lhs: Predicate, rhs: Predicate) -> Predicate {
    Arc::new(move |value, bindings| lhs(value, bindings) && rhs(value, bindings))
}

/// Short-circuit disjunction of two predicates.
pub fn or(lhs: Predicate, rhs: Predicate) -> Predicate {
    Arc::new(move |value, bindings| lhs(value, bindings) || rhs(value, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Bindings<'static> {
        Bindings::new(&[])
    }

    #[test]
    fn divides_filters_non_divisors() {
        let p = divides(8);
        let admitted: Vec<i64> = (1..=8)
            .filter(|&i| p(&Value::Int(i), &empty()))
            .collect();
        assert_eq!(admitted, vec![1, 2, 4, 8]);
    }

    #[test]
    fn multiple_of_filters() {
        let p = multiple_of(4);
        assert!(p(&Value::Int(8), &empty()));
        assert!(!p(&Value::Int(6), &empty()));
    }

    #[test]
    fn combinators_short_circuit() {
        let p = and(greater_than(2), less_than(6));
        let admitted: Vec<i64> = (0..10)
            .filter(|&i| p(&Value::Int(i), &empty()))
            .collect();
        assert_eq!(admitted, vec![3, 4, 5]);

        let q = or(equal(1), equal(9));
        assert!(q(&Value::Int(9), &empty()));
        assert!(!q(&Value::Int(5), &empty()));
    }

    #[test]
    fn predicates_reject_non_numeric_values() {
        let p = less_than(10);
        assert!(!p(&Value::Str("nope".into()), &empty()));
    }

    #[test]
    fn bindings_lookup_by_name_and_position() {
        let bound = vec![
            ("M".to_string(), Value::Int(4)),
            ("N".to_string(), Value::Int(2)),
        ];
        let bindings = Bindings::new(&bound);
        assert_eq!(bindings.value_of("M"), Some(&Value::Int(4)));
        assert_eq!(bindings.at(1), Some(&Value::Int(2)));
        assert_eq!(bindings.value_of("K"), None);
    }

    #[test]
    fn inter_parameter_constraint_via_bindings() {
        // N admissible iff M * N <= 8, with M bound earlier.
        let p: Predicate = Arc::new(|value, bindings| {
            let m = bindings
                .value_of("M")
                .and_then(|v| v.to_i64().ok())
                .unwrap_or(0);
            value.to_i64().map_or(false, |n| m * n <= 8)
        });
        let bound = vec![("M".to_string(), Value::Int(4))];
        let bindings = Bindings::new(&bound);
        assert!(p(&Value::Int(2), &bindings));
        assert!(!p(&Value::Int(4), &bindings));
    }
}
