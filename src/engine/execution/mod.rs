pub mod binder;
pub mod config;
pub mod execution_order;
pub mod patch;

// Re-export commonly used types
pub use binder::{bind_all, tick_cycle, Schedule};
pub use config::{ConcurrencyMode, EngineConfig};
pub use execution_order::ExecutionOrderBuilder;
pub use patch::Patch;
