use thiserror::Error;

/// Main error type for the atune system
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Big integer overflow: {0}")]
    BigIntOverflow(String),

    #[error("Narrowing error: {0}")]
    Narrowing(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Csv error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the workspace
pub type TunerResult<T> = Result<T, TunerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        fn failing() -> TunerResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        let err = failing().unwrap_err();
        assert!(matches!(err, TunerError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn display_includes_kind() {
        let err = TunerError::OutOfRange("index 12 >= 10".into());
        assert_eq!(err.to_string(), "Out of range: index 12 >= 10");
    }
}
