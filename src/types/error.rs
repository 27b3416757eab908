use thiserror::Error;

/// penguin-metrics error types
#[derive(Error, Debug)]
pub enum PenguinError {
    /// Company identifier rejected before querying
    #[error("invalid company id: {0}")]
    InvalidCompanyId(String),

    /// Date range rejected before querying
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// Underlying metric store failed
    #[error("query error: {0}")]
    Query(String),

    /// Failed to parse JSON/JSONL
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for penguin-metrics
pub type Result<T> = std::result::Result<T, PenguinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PenguinError::InvalidCompanyId("empty".into());
        assert_eq!(err.to_string(), "invalid company id: empty");
    }

    #[test]
    fn test_date_range_error_display() {
        let err = PenguinError::InvalidDateRange("start after end".into());
        assert_eq!(err.to_string(), "invalid date range: start after end");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PenguinError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
