//! Discussion domain
//!
//! A [`Discussion`] is one run of the engine: a topic, a fixed cast of
//! [`Role`]s and an append-only transcript of [`Message`]s.
//!
//! # Lifecycle
//!
//! ```text
//!   Created ──start──▶ Active ──stop──────▶ Stopped
//!                        │
//!                        ├──consensus / max turns──▶ Completed
//!                        │
//!                        └──unrecoverable error────▶ Failed
//! ```
//!
//! `Stopped`, `Completed` and `Failed` are terminal: the transcript stays
//! readable but nothing more is appended.

pub mod entities;
pub mod event;
pub mod mention;
pub mod message;
pub mod role;

pub use entities::{Discussion, DiscussionId, DiscussionStatus};
pub use event::{DiscussionEvent, FailureClass};
pub use mention::{extract_mentions, mention_key};
pub use message::{Message, Speaker};
pub use role::Role;
