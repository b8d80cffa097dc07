use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NavigationData {
    pub nav: crate::models::ShipNav,
    pub fuel: crate::models::ShipFuel,
}

#[derive(Debug, Deserialize)]
pub struct NavData {
    pub nav: crate::models::ShipNav,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionData {
    pub cooldown: crate::models::ShipCooldown,
    pub extraction: ExtractionResult,
    pub cargo: crate::models::ShipCargo,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "yield")]
    pub extraction_yield: ExtractionYield,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionYield {
    pub symbol: String,
    pub units: i32,
}

#[derive(Debug, Deserialize)]
pub struct SellCargoData {
    pub cargo: crate::models::ShipCargo,
    pub transaction: SellTransaction,
}

#[derive(Debug, Deserialize)]
pub struct SellTransaction {
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    pub units: i32,
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: i32,
    #[serde(rename = "totalPrice")]
    pub total_price: i32,
}
