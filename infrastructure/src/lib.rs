//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: an OpenAI-compatible HTTP gateway, a static
//! role supplier, transcript and channel observers, and configuration file
//! loading.

pub mod config;
pub mod logging;
pub mod observers;
pub mod providers;
pub mod roles;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlTranscriptObserver;
pub use observers::ChannelObserver;
pub use providers::OpenAiCompatibleGateway;
pub use roles::StaticRoleSupplier;
