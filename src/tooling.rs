//! Tooling & Integration Layer
//!
//! Command-line surface over the packing library.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
