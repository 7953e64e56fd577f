//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Quote error: {0}")]
    Quote(#[from] simtrade_core::CoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] simtrade_engine::EngineError),

    #[error("Risk error: {0}")]
    Risk(#[from] simtrade_risk::RiskError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] simtrade_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
