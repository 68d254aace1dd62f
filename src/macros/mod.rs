//! Macros for declaring module templates
//!
//! This module provides declarative macros that cut the boilerplate of
//! writing out field lists for every module kind.

pub mod template_macros;
