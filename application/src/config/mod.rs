//! Application-level configuration.
//!
//! This module provides configuration types that control how the turn loop
//! behaves:
//!
//! - [`EngineConfig`]: turn budget, roster size, prompt window, timeouts
//! - [`SelectionConfig`]: model-assisted speaker selection
//! - [`ConsensusConfig`]: consensus threshold, window and weights
//! - [`RetryPolicy`]: bounded exponential backoff for provider calls

pub mod engine;
pub mod retry;

pub use engine::{ConsensusConfig, EngineConfig, SelectionConfig};
pub use retry::RetryPolicy;
