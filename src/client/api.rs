use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::client::{ApiError, ApiResult, ShipCommandApi, ShipStateProvider};
use crate::models::*;
use crate::API_BASE_URL;

#[derive(Clone)]
pub struct SpaceTradersClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpaceTradersClient {
    pub fn new(token: &str) -> ApiResult<Self> {
        Self::with_base_url(token, API_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(SpaceTradersClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        action: &'static str,
        method: &str,
        url: &str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read response".to_string());
        debug!(method, url, status = status.as_u16(), "🌐 API call");

        if !status.is_success() {
            return Err(ApiError::Status {
                action,
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, action: &'static str, path: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        self.read_response(action, "GET", &url, response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        action: &'static str,
        path: &str,
        payload: serde_json::Value,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(&payload).send().await?;
        self.read_response(action, "POST", &url, response).await
    }

    // Agent operations
    pub async fn get_agent(&self) -> ApiResult<Agent> {
        let agent_response: AgentResponse = self.get("Get agent", "/my/agent").await?;
        Ok(agent_response.data)
    }

    // Ship operations
    pub async fn get_ships(&self) -> ApiResult<Vec<Ship>> {
        let ships_response: ShipsResponse = self.get("Get ships", "/my/ships").await?;
        Ok(ships_response.data)
    }

    pub async fn get_ship(&self, ship_symbol: &str) -> ApiResult<Ship> {
        let path = format!("/my/ships/{}", ship_symbol);
        let ship_response: ShipResponse = self.get("Get ship", &path).await?;
        Ok(ship_response.data)
    }

    pub async fn orbit(&self, ship_symbol: &str) -> ApiResult<ShipNav> {
        let path = format!("/my/ships/{}/orbit", ship_symbol);
        let orbit_response: OrbitResponse = self.post("Orbit", &path, serde_json::json!({})).await?;
        Ok(orbit_response.data.nav)
    }

    pub async fn dock(&self, ship_symbol: &str) -> ApiResult<ShipNav> {
        let path = format!("/my/ships/{}/dock", ship_symbol);
        let dock_response: DockResponse = self.post("Dock", &path, serde_json::json!({})).await?;
        Ok(dock_response.data.nav)
    }

    pub async fn navigate(&self, ship_symbol: &str, waypoint_symbol: &str) -> ApiResult<NavigationData> {
        let path = format!("/my/ships/{}/navigate", ship_symbol);
        let payload = serde_json::json!({
            "waypointSymbol": waypoint_symbol
        });
        let nav_response: NavigationResponse = self.post("Navigation", &path, payload).await?;
        Ok(nav_response.data)
    }

    pub async fn extract(&self, ship_symbol: &str) -> ApiResult<ExtractionData> {
        let path = format!("/my/ships/{}/extract", ship_symbol);
        let extraction_response: ExtractionResponse =
            self.post("Extraction", &path, serde_json::json!({})).await?;
        Ok(extraction_response.data)
    }

    pub async fn sell(&self, ship_symbol: &str, trade_symbol: &str, units: i32) -> ApiResult<SellCargoData> {
        let path = format!("/my/ships/{}/sell", ship_symbol);
        let payload = serde_json::json!({
            "symbol": trade_symbol,
            "units": units
        });
        let sell_response: SellCargoResponse = self.post("Cargo sell", &path, payload).await?;
        Ok(sell_response.data)
    }
}

#[async_trait]
impl ShipCommandApi for SpaceTradersClient {
    async fn orbit_ship(&self, ship_symbol: &str) -> ApiResult<()> {
        let nav = self.orbit(ship_symbol).await?;
        debug!(ship = ship_symbol, status = %nav.status, "🛰️ Orbit confirmed");
        Ok(())
    }

    async fn dock_ship(&self, ship_symbol: &str) -> ApiResult<()> {
        let nav = self.dock(ship_symbol).await?;
        debug!(ship = ship_symbol, waypoint = %nav.waypoint_symbol, "🛬 Docked");
        Ok(())
    }

    async fn navigate_ship(&self, ship_symbol: &str, waypoint_symbol: &str) -> ApiResult<()> {
        let data = self.navigate(ship_symbol, waypoint_symbol).await?;
        info!(
            ship = ship_symbol,
            destination = waypoint_symbol,
            fuel = data.fuel.current,
            "🚀 Navigation started"
        );
        Ok(())
    }

    async fn extract_resources(&self, ship_symbol: &str) -> ApiResult<()> {
        let data = self.extract(ship_symbol).await?;
        info!(
            ship = ship_symbol,
            symbol = %data.extraction.extraction_yield.symbol,
            units = data.extraction.extraction_yield.units,
            cargo = %format!("{}/{}", data.cargo.units, data.cargo.capacity),
            cooldown = data.cooldown.remaining_seconds,
            "⛏️ Extracted"
        );
        Ok(())
    }

    async fn sell_cargo(&self, ship_symbol: &str, trade_symbol: &str, units: i32) -> ApiResult<()> {
        let data = self.sell(ship_symbol, trade_symbol, units).await?;
        info!(
            ship = ship_symbol,
            symbol = %data.transaction.trade_symbol,
            units = data.transaction.units,
            revenue = data.transaction.total_price,
            "💰 Sold cargo"
        );
        Ok(())
    }
}

#[async_trait]
impl ShipStateProvider for SpaceTradersClient {
    async fn fetch_ship(&self, ship_symbol: &str) -> ApiResult<Ship> {
        self.get_ship(ship_symbol).await
    }
}
