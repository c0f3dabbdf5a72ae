//! Presentation layer for conclave
//!
//! This crate contains the CLI definition, the live console observer and
//! the final report formatter.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleObserver;
pub use output::report::{DiscussionReport, ReportFormatter};
