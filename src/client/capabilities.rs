//! Seams between the automation core and the game API.

use async_trait::async_trait;

use crate::client::ApiResult;
use crate::models::Ship;

/// Ship commands the automation may issue. Every call either lands or
/// returns the API's refusal; nothing is retried here.
#[async_trait]
pub trait ShipCommandApi: Send + Sync {
    async fn orbit_ship(&self, ship_symbol: &str) -> ApiResult<()>;

    async fn dock_ship(&self, ship_symbol: &str) -> ApiResult<()>;

    async fn navigate_ship(&self, ship_symbol: &str, waypoint_symbol: &str) -> ApiResult<()>;

    async fn extract_resources(&self, ship_symbol: &str) -> ApiResult<()>;

    async fn sell_cargo(&self, ship_symbol: &str, trade_symbol: &str, units: i32) -> ApiResult<()>;
}

/// Fresh ship snapshots, one request per call.
#[async_trait]
pub trait ShipStateProvider: Send + Sync {
    async fn fetch_ship(&self, ship_symbol: &str) -> ApiResult<Ship>;
}
