//! Logging infrastructure: machine-readable discussion transcripts.
//!
//! Provides [`JsonlTranscriptObserver`], a JSONL file writer that implements
//! the [`ObserverConnection`](conclave_application::ObserverConnection) port.

mod jsonl_observer;

pub use jsonl_observer::JsonlTranscriptObserver;
