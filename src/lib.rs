// SpaceTraders Mining Automation Library
// Per-ship mining loops: pure decision rules driven by a polling scheduler

pub mod models;
pub mod client;
pub mod operations;
pub mod admiral;
pub mod storage;
pub mod config;
pub mod verbosity;

// Re-export commonly used types
pub use models::{
    ship::{Ship, ShipNav, ShipNavStatus, ShipCargo, CargoItem},
    automation::{AutomationConfig, AutomationStatus, ConfigDefaults, Decision, DecisionAction},
};

pub use client::{ApiError, SpaceTradersClient};
pub use operations::{AutomationScheduler, CacheInvalidation, TickOutcome};
pub use admiral::Admiral;
pub use config::AutomationSettings;

// Constants
pub const API_BASE_URL: &str = "https://api.spacetraders.io/v2";
pub const AGENT_TOKEN_FILE: &str = "AGENT_TOKEN";
