//! Concrete parameter assignments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Value;

/// One concrete assignment of a value to every declared tuning parameter.
///
/// Entries keep declaration order across all groups, which is also the column
/// order of the tuning log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    entries: Vec<(String, Value)>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl FromIterator<(String, Value)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name} = {value}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_declaration_order() {
        let mut config = Configuration::new();
        config.push("WPT", Value::Size(4));
        config.push("LS", Value::Size(250));
        let names: Vec<_> = config.names().collect();
        assert_eq!(names, vec!["WPT", "LS"]);
    }

    #[test]
    fn lookup_by_name() {
        let mut config = Configuration::new();
        config.push("CACHE", Value::Int(64));
        assert_eq!(config.get("CACHE"), Some(&Value::Int(64)));
        assert_eq!(config.get("MISSING"), None);
    }

    #[test]
    fn display_lists_pairs() {
        let mut config = Configuration::new();
        config.push("M", Value::Int(2));
        config.push("N", Value::Int(4));
        assert_eq!(config.to_string(), "M = 2, N = 4");
    }
}
