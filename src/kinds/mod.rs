//! Built-in module kinds

pub mod compare;
pub mod constant;
pub mod mixer;
pub mod noise;
pub mod panner;
pub mod select;
pub mod sine;

use crate::engine::components::registry::Registry;
use crate::engine::error::PatchError;

/// Register every built-in kind
pub fn register_core(registry: &mut Registry) -> Result<(), PatchError> {
    for factory in [
        constant::factory()?,
        sine::factory()?,
        noise::factory()?,
        mixer::factory()?,
        compare::factory()?,
        select::factory()?,
        panner::factory()?,
    ] {
        registry.register(factory)?;
    }
    Ok(())
}
