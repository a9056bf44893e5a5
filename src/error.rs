//! Top-level error for a benchmark run.

use config::ConfigError;
use std::fmt;

use crate::connection::ConnectionError;
use crate::executor::ExecutorError;
use crate::results::ResultsError;

#[derive(Debug)]
pub enum BenchError {
    Config(ConfigError),
    Connection {
        target: String,
        source: ConnectionError,
    },
    Execution {
        target: String,
        source: ExecutorError,
    },
    Results(ResultsError),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Config(e) => write!(f, "configuration error: {e}"),
            BenchError::Connection { target, source } => {
                write!(f, "target {target}: {source}")
            }
            BenchError::Execution { target, source } => {
                write!(f, "target {target}: {source}")
            }
            BenchError::Results(e) => write!(f, "results error: {e}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Config(e) => Some(e),
            BenchError::Connection { source, .. } => Some(source),
            BenchError::Execution { source, .. } => Some(source),
            BenchError::Results(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BenchError {
    fn from(err: ConfigError) -> Self {
        BenchError::Config(err)
    }
}

impl From<ResultsError> for BenchError {
    fn from(err: ResultsError) -> Self {
        BenchError::Results(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_target() {
        let err = BenchError::Execution {
            target: "replica".to_string(),
            source: ExecutorError::QueryError("relation does not exist".to_string()),
        };
        let text = err.to_string();
        assert!(text.starts_with("target replica:"));
        assert!(text.contains("relation does not exist"));
    }

    #[test]
    fn test_from_results_error() {
        let err: BenchError = ResultsError::UnknownTarget("x".to_string()).into();
        assert!(matches!(err, BenchError::Results(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
