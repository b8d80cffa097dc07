use serde::Deserialize;

/// Every game API payload arrives wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

pub type AgentResponse = DataEnvelope<crate::models::Agent>;
pub type ShipResponse = DataEnvelope<crate::models::Ship>;
pub type ShipsResponse = DataEnvelope<Vec<crate::models::Ship>>;
pub type OrbitResponse = DataEnvelope<crate::models::NavData>;
pub type DockResponse = DataEnvelope<crate::models::NavData>;
pub type NavigationResponse = DataEnvelope<crate::models::NavigationData>;
pub type ExtractionResponse = DataEnvelope<crate::models::ExtractionData>;
pub type SellCargoResponse = DataEnvelope<crate::models::SellCargoData>;
