//! In-process observer connections

mod channel;

pub use channel::ChannelObserver;
