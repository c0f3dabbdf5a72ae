//! Domain layer for conclave
//!
//! This crate contains the core entities and the pure decision logic of a
//! panel discussion. It has no dependencies on infrastructure or presentation
//! concerns, and never performs I/O.
//!
//! # Core Concepts
//!
//! ## Discussion
//!
//! One run of the engine over a fixed topic and a fixed cast of [`Role`]s.
//! Messages are appended in turn order and never modified afterwards.
//!
//! ## Speaker policy
//!
//! Who speaks next is decided by `@mention` bias first, then by a model hint,
//! and finally by a deterministic round-robin that never repeats the previous
//! speaker (see [`selection`]).
//!
//! ## Consensus
//!
//! Convergence is scored from three signals (lexical agreement, cross-role
//! similarity and a model adjudication) combined with fixed weights
//! (see [`consensus`]).

pub mod consensus;
pub mod core;
pub mod discussion;
pub mod prompt;
pub mod selection;

// Re-export commonly used types
pub use consensus::{
    AdjudicationVerdict, ConsensusResult, ConsensusWeights, Recommendation, ScoreBreakdown,
    cross_role_similarity, detect_stalemate, lexical_agreement, parse_adjudication,
};
pub use core::error::DomainError;
pub use discussion::{
    Discussion, DiscussionEvent, DiscussionId, DiscussionStatus, FailureClass, Message, Role,
    Speaker, extract_mentions, mention_key,
};
pub use prompt::PromptTemplate;
pub use selection::{SelectionSource, mention_target, round_robin_after, validate_model_choice};
