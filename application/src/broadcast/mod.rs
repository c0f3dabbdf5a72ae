//! Event fan-out to live observers

pub mod hub;

pub use hub::{BroadcastHub, ConnectionId};
