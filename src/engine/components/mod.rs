pub mod factory;
pub mod fields;
pub mod module;
pub mod registry;
pub mod template;

// Re-export commonly used types
pub use factory::{Args, Factory};
pub use fields::{Field, FieldTable};
pub use module::{cached, BoundInputs, Constructor, Module, ModuleKind, ModuleState};
pub use registry::Registry;
pub use template::{FieldSpec, Template};
