// Mining automation records: per-ship config, status, and tick decisions
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::models::Ship;

/// Polling periods below this are raised to it to bound the request rate.
pub const MIN_INTERVAL_SECONDS: i64 = 5;

/// Mining-and-selling objective for one ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationConfig {
    pub ship_symbol: String,
    pub mine_waypoint: String,
    pub market_waypoint: String,
    pub trade_symbol: String,
    /// `None` means "sell once the hold is at capacity".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_at_units: Option<i32>,
    pub interval_seconds: i64,
}

impl AutomationConfig {
    /// Config for a ship that has never been automated: mine and sell where
    /// the ship currently sits, sell when the hold is full.
    pub fn from_ship(ship: &Ship, defaults: &ConfigDefaults) -> Self {
        Self {
            ship_symbol: ship.symbol.clone(),
            mine_waypoint: ship.nav.waypoint_symbol.clone(),
            market_waypoint: ship.nav.waypoint_symbol.clone(),
            trade_symbol: defaults.trade_symbol.clone(),
            sell_at_units: Some(ship.cargo.capacity),
            interval_seconds: defaults.interval_seconds,
        }
    }

    /// Units of the trade good that trigger a sale. Never below 1.
    pub fn effective_sell_threshold(&self, cargo_capacity: i32) -> i32 {
        self.sell_at_units.unwrap_or(cargo_capacity).max(1)
    }

    pub fn effective_interval_seconds(&self) -> u64 {
        self.interval_seconds.max(MIN_INTERVAL_SECONDS).unsigned_abs()
    }

    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs(self.effective_interval_seconds())
    }
}

/// Values used when a config is created from a ship snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub trade_symbol: String,
    pub interval_seconds: i64,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            trade_symbol: "IRON_ORE".to_string(),
            interval_seconds: 15,
        }
    }
}

/// Outcome of the most recent tick for a ship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl AutomationStatus {
    pub fn record_success(&mut self, message: &str, at: DateTime<Utc>) {
        self.last_action = Some(message.to_string());
        self.last_error = None;
        self.last_updated = Some(at);
    }

    /// Keeps `last_action` so the last thing that worked stays visible.
    pub fn record_failure(&mut self, error: &str, at: DateTime<Utc>) {
        self.last_error = Some(error.to_string());
        self.last_updated = Some(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Idle,
    Orbit,
    Dock,
    Navigate,
    Extract,
    Sell,
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionAction::Idle => "idle",
            DecisionAction::Orbit => "orbit",
            DecisionAction::Dock => "dock",
            DecisionAction::Navigate => "navigate",
            DecisionAction::Extract => "extract",
            DecisionAction::Sell => "sell",
        };
        f.write_str(label)
    }
}

/// What a single automation step did, or why it did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    pub message: String,
}

impl Decision {
    pub fn new(action: DecisionAction, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }

    pub fn idle(message: impl Into<String>) -> Self {
        Self::new(DecisionAction::Idle, message)
    }
}
