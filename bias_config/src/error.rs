use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no tuning record stored")]
    NotFound,
    #[error("stored tuning record is corrupt: {0}")]
    Corrupt(&'static str),
    #[error("{field} out of range: {value} (allowed {allowed})")]
    OutOfRange {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("unknown tuning parameter: {0}")]
    UnknownKey(String),
    #[error("storage io error: {0}")]
    Io(String),
}
