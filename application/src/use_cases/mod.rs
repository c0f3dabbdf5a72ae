//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod consensus_detector;
pub mod orchestrator;
pub mod retry;
pub mod speaker_selector;
