// Operations module - mining automation built on per-ship commands

pub mod ship;
pub mod mining_automation;
pub mod automation_scheduler;

pub use ship::*;
pub use mining_automation::*;
pub use automation_scheduler::*;
