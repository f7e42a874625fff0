//! The cost-function contract.

use at_types::{Configuration, TunerResult};

/// Measures one configuration and returns a non-negative scalar cost to
/// minimize (units are the callable's business).
///
/// Failure is signaled by `Err(_)` or by returning
/// [`at_types::INVALID_COST`]; either way the engine records the
/// configuration as invalid and reports the sentinel to the search
/// technique.
///
/// Blanket-implemented for closures, so a plain
/// `|config| Ok(measure(config))` works.
pub trait CostFunction {
    fn evaluate(&mut self, configuration: &Configuration) -> TunerResult<f64>;
}

impl<F> CostFunction for F
where
    F: FnMut(&Configuration) -> TunerResult<f64>,
{
    fn evaluate(&mut self, configuration: &Configuration) -> TunerResult<f64> {
        self(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_types::{TunerError, Value};

    #[test]
    fn closures_implement_the_contract() {
        let mut calls = 0usize;
        let mut cf = |config: &Configuration| {
            calls += 1;
            Ok(config.get("x").unwrap().to_f64().unwrap() * 2.0)
        };

        let mut config = Configuration::new();
        config.push("x", Value::Int(21));
        assert_eq!(cf.evaluate(&config).unwrap(), 42.0);
        drop(cf);
        assert_eq!(calls, 1);
    }

    #[test]
    fn failure_propagates() {
        let mut cf =
            |_: &Configuration| -> TunerResult<f64> { Err(TunerError::InvalidConfig("boom".into())) };
        assert!(cf.evaluate(&Configuration::new()).is_err());
    }
}
