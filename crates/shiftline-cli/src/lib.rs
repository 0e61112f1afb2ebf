//! # Shiftline CLI
//!
//! Argument parsing and run driver for the `shiftline` binary.

pub mod cli;

pub use cli::{build_command, config_from_matches, execute, CliOptions, Outcome};
