pub mod port;
pub mod reference;

// Re-export commonly used types
pub use port::{DoublePort, GatePort, Port, PortHandle, PortId, PortValue};
pub use reference::{Reference, Target};
