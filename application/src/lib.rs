//! Application layer for conclave
//!
//! This crate contains the discussion use cases, the broadcast hub and the
//! port definitions that infrastructure adapters implement. It depends only
//! on the domain layer.
//!
//! # Control flow of one agent turn
//!
//! ```text
//! SpeakerSelector ─▶ LlmGateway ─▶ transcript append ─▶ BroadcastHub
//!        ▲                                                    │
//!        └──────── loop ◀── BroadcastHub ◀── ConsensusDetector ◀┘
//! ```

pub mod broadcast;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use broadcast::{BroadcastHub, ConnectionId};
pub use config::{ConsensusConfig, EngineConfig, RetryPolicy, SelectionConfig};
pub use ports::{
    llm_gateway::{CompletionRequest, GatewayError, LlmGateway},
    observer::{DeliveryError, ObserverConnection},
    repository::{
        DiscussionRepository, DiscussionSnapshot, InMemoryDiscussionRepository, MessagePage,
        RepositoryError,
    },
    role_supplier::{RoleSupplier, RoleSupplierError},
};
pub use use_cases::consensus_detector::ConsensusDetector;
pub use use_cases::orchestrator::{DiscussionError, DiscussionOrchestrator};
pub use use_cases::retry::{RetryExhausted, with_retry};
pub use use_cases::speaker_selector::{Selection, SpeakerSelector};
