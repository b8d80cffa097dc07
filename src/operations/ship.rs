// Individual ship operations module
use async_trait::async_trait;

use crate::client::{ApiResult, ShipCommandApi};

/// Commands for one already-chosen ship. The mining step issues at most one
/// of these per tick.
#[async_trait]
pub trait ShipCommands: Send + Sync {
    async fn dock(&self) -> ApiResult<()>;

    async fn orbit(&self) -> ApiResult<()>;

    async fn navigate(&self, waypoint_symbol: &str) -> ApiResult<()>;

    async fn extract(&self) -> ApiResult<()>;

    async fn sell(&self, trade_symbol: &str, units: i32) -> ApiResult<()>;
}

/// Binds a ship symbol to the fleet-wide command API.
pub struct ShipOperations<'a> {
    ship_symbol: &'a str,
    api: &'a dyn ShipCommandApi,
}

impl<'a> ShipOperations<'a> {
    pub fn new(ship_symbol: &'a str, api: &'a dyn ShipCommandApi) -> Self {
        Self { ship_symbol, api }
    }
}

#[async_trait]
impl ShipCommands for ShipOperations<'_> {
    async fn dock(&self) -> ApiResult<()> {
        self.api.dock_ship(self.ship_symbol).await
    }

    async fn orbit(&self) -> ApiResult<()> {
        self.api.orbit_ship(self.ship_symbol).await
    }

    async fn navigate(&self, waypoint_symbol: &str) -> ApiResult<()> {
        self.api.navigate_ship(self.ship_symbol, waypoint_symbol).await
    }

    async fn extract(&self) -> ApiResult<()> {
        self.api.extract_resources(self.ship_symbol).await
    }

    async fn sell(&self, trade_symbol: &str, units: i32) -> ApiResult<()> {
        self.api.sell_cargo(self.ship_symbol, trade_symbol, units).await
    }
}
