//! Console output module.
//!
//! This module handles:
//! - Colored console output
//! - JSON output formatting
//! - Interactive confirmation prompts

pub mod console;

pub use console::ConsoleOutput;
