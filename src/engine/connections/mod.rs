pub mod resolver;

pub use resolver::{ExportIndex, Resolve};
