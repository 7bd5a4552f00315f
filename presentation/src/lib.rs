//! Presentation layer for hearth
//!
//! This crate contains the CLI definitions and console output formatting.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, JsonlCommand, OutputFormat, StreamCommand};
pub use output::console::{ChunkReport, ConsoleFormatter};
