//! Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use simtrade_admission::AdmissionConfig;
use simtrade_engine::EngineConfig;
use simtrade_ledger::AccountConfig;
use simtrade_risk::RiskConfig;

use crate::error::{AppError, AppResult};

/// Desk behaviour per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Evaluate price/time stops on held positions each session.
    #[serde(default = "default_true")]
    pub exit_check_enabled: bool,
    /// Cancel orders still in flight at session end (day orders).
    #[serde(default = "default_true")]
    pub cancel_unfilled_at_close: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            exit_check_enabled: true,
            cancel_unfilled_at_close: true,
        }
    }
}

/// Top-level configuration, one section per pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub desk: DeskConfig,
}

impl AppConfig {
    /// Load `SIMTRADE_CONFIG` (or `config/default.toml`) with
    /// `SIMTRADE__SECTION__KEY` environment overrides.
    ///
    /// A missing file falls back to defaults.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("SIMTRADE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if !Path::new(&config_path).exists() {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::new(&config_path, config::FileFormat::Toml).required(false),
            )
            .add_source(
                config::Environment::with_prefix("SIMTRADE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.account
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.engine
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.risk
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.admission
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(())
    }
}
