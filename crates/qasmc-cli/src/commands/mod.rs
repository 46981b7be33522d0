//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod library;
pub mod tokens;
