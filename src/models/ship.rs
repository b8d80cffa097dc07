use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time read of a ship, as returned by `GET /my/ships/{symbol}`.
///
/// Only the parts the automation looks at are modelled; serde ignores the
/// rest of the payload (frame, reactor, mounts, crew...).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Ship {
    pub symbol: String,
    pub registration: ShipRegistration,
    pub nav: ShipNav,
    pub cargo: ShipCargo,
    pub cooldown: ShipCooldown,
    pub fuel: ShipFuel,
}

impl Ship {
    pub fn is_docked(&self) -> bool {
        self.nav.status == ShipNavStatus::Docked
    }

    pub fn is_in_transit(&self) -> bool {
        self.nav.status == ShipNavStatus::InTransit
    }

    pub fn is_at(&self, waypoint_symbol: &str) -> bool {
        self.nav.waypoint_symbol == waypoint_symbol
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipRegistration {
    pub name: String,
    #[serde(rename = "factionSymbol")]
    pub faction_symbol: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipNav {
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    pub status: ShipNavStatus,
    #[serde(rename = "flightMode")]
    pub flight_mode: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipNavStatus {
    InTransit,
    InOrbit,
    Docked,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ShipNavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShipNavStatus::InTransit => "IN_TRANSIT",
            ShipNavStatus::InOrbit => "IN_ORBIT",
            ShipNavStatus::Docked => "DOCKED",
            ShipNavStatus::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipCooldown {
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "totalSeconds")]
    pub total_seconds: i32,
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: i32,
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipCargo {
    pub capacity: i32,
    pub units: i32,
    pub inventory: Vec<CargoItem>,
}

impl ShipCargo {
    /// Units held of `trade_symbol`, 0 when the symbol is not in the hold.
    pub fn units_of(&self, trade_symbol: &str) -> i32 {
        self.inventory
            .iter()
            .find(|item| item.symbol == trade_symbol)
            .map(|item| item.units)
            .unwrap_or(0)
    }

    pub fn is_full(&self) -> bool {
        self.units >= self.capacity
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CargoItem {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipFuel {
    pub current: i32,
    pub capacity: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Agent {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    #[serde(rename = "startingFaction")]
    pub starting_faction: String,
    #[serde(rename = "shipCount")]
    pub ship_count: i32,
}
