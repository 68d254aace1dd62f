pub mod description;

pub use description::{ArgValue, PatchDescription, PatchEntry};
