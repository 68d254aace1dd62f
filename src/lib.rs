//! Dataflow patch engine
//!
//! Modules are built from templates by named factories, wired together through
//! late-bound references, and evaluated once per tick in dependency order.

pub mod engine;
pub mod kinds;
mod macros;

// Re-export commonly used types
pub use crate::engine::builder::{ArgValue, PatchDescription, PatchEntry};
pub use crate::engine::components::{
    cached, Args, BoundInputs, Factory, Field, FieldTable, Module, ModuleKind, ModuleState, Registry, Template,
};
pub use crate::engine::error::PatchError;
pub use crate::engine::execution::{bind_all, tick_cycle, ConcurrencyMode, EngineConfig, Patch, Schedule};
pub use crate::engine::types::{FieldRef, FieldType, Literal, PortKind};
pub use crate::engine::values::{DoublePort, GatePort, Port, PortHandle, PortId, PortValue, Reference, Target};
pub use crate::kinds::register_core;
