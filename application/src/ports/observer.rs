//! Observer connection port
//!
//! An observer is one live subscriber to a discussion's events, attached to
//! the [`BroadcastHub`](crate::broadcast::BroadcastHub). How events reach
//! the subscriber (terminal, file, socket) is up to the implementation.

use async_trait::async_trait;
use conclave_domain::DiscussionEvent;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Connection closed")]
    Closed,

    #[error("Delivery timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// A live subscriber.
///
/// A failed delivery detaches the connection; it is never retried.
#[async_trait]
pub trait ObserverConnection: Send + Sync {
    async fn deliver(&self, event: &DiscussionEvent) -> Result<(), DeliveryError>;

    /// Human-readable name used in logs
    fn label(&self) -> String {
        "observer".to_string()
    }

    /// Called when the hub drops the connection during shutdown
    async fn close(&self) {}
}
