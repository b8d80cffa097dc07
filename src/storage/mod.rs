// Storage module for persistent automation state
pub mod kv_store;

pub use kv_store::*;
