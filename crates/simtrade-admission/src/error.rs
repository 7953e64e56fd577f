//! Admission error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;
