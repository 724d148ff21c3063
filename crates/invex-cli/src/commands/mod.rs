//! Subcommand implementations.

pub mod batch;
pub mod config;
mod enrich;
mod input;
pub mod process;
