//! CLI command implementations.

pub mod image;
pub mod simulate;
