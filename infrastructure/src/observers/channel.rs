//! Observer forwarding events into a tokio channel
//!
//! Lets an in-process consumer (a UI task, a test) read a discussion's
//! events as a stream. Dropping the receiver detaches the observer at the
//! next delivery.

use async_trait::async_trait;
use conclave_application::{DeliveryError, ObserverConnection};
use conclave_domain::DiscussionEvent;
use tokio::sync::mpsc;

pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<DiscussionEvent>,
    label: String,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn new(label: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<DiscussionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                label: label.into(),
            },
            receiver,
        )
    }
}

#[async_trait]
impl ObserverConnection for ChannelObserver {
    async fn deliver(&self, event: &DiscussionEvent) -> Result<(), DeliveryError> {
        self.sender
            .send(event.clone())
            .map_err(|_| DeliveryError::Closed)
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}
