//! Session driver for the simtrade ledger.
//!
//! Wires the pipeline together for one account:
//! - `AppConfig`: TOML configuration for every stage
//! - `Desk`: per-session admission, fills, exit scanning and session close
//! - `ExitScanner`: price-stop / time-stop exits on held positions
//! - `ReplayFeed` / `Scenario`: file-driven quote replay

pub mod config;
pub mod desk;
pub mod error;
pub mod exits;
pub mod feed;
pub mod replay;

pub use config::{AppConfig, DeskConfig};
pub use desk::Desk;
pub use error::{AppError, AppResult};
pub use exits::{ExitOrder, ExitScanner};
pub use feed::{BoxFuture, QuoteFeed, ReplayFeed};
pub use replay::{run_scenario, ReplayReport, Scenario, ScenarioSession, ScenarioTick, SessionReport};
