//! simtrade desk - replay a scenario through the simulated ledger.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use simtrade_desk::{run_scenario, AppConfig, Desk, ReplayFeed, Scenario};
use simtrade_telemetry::Metrics;

/// Simulated A-share trading desk
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SIMTRADE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Scenario file to replay
    #[arg(short, long, default_value = "config/scenario_demo.toml")]
    scenario: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    simtrade_telemetry::init_logging()?;

    info!("Starting simtrade desk v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > SIMTRADE_CONFIG / defaults with env overrides
    let config = match &args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            AppConfig::from_file(path)?
        }
        None => AppConfig::load()?,
    };
    info!(
        initial_capital = %config.account.initial_capital,
        max_positions = config.admission.max_positions,
        "Configuration loaded"
    );

    let scenario = Scenario::from_file(&args.scenario)?;
    info!(scenario = %args.scenario, sessions = scenario.sessions.len(), "Scenario loaded");

    let mut desk = Desk::new(&config, ReplayFeed::new())?;
    let report = run_scenario(&mut desk, &scenario).await?;

    info!(
        status = %serde_json::to_string(&report.final_status)?,
        "Final account status"
    );
    debug!(report = %serde_json::to_string_pretty(&report)?, "Replay report");
    debug!(metrics = %Metrics::render()?, "Metrics");

    Ok(())
}
