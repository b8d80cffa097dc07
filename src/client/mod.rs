// Client module - SpaceTraders API client and the traits the automation consumes
pub mod api;
pub mod capabilities;
pub mod error;

pub use api::SpaceTradersClient;
pub use capabilities::{ShipCommandApi, ShipStateProvider};
pub use error::{ApiError, ApiResult};
