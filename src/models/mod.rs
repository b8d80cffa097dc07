// Models module - Ship snapshots, API payloads and automation records

pub mod ship;
pub mod automation;
pub mod transaction;
pub mod responses;

pub use ship::*;
pub use automation::*;
pub use transaction::*;
pub use responses::*;
