//! Consensus scoring
//!
//! Pure functions that turn a trailing window of the transcript into a
//! convergence score. The model adjudication call itself lives in the
//! application layer; this module only parses its answer.
//!
//! # Signals
//!
//! | Signal | Function | Neutral value |
//! |--------|----------|---------------|
//! | Lexical agreement | [`lexical_agreement`] | 0.5 (no terms found) |
//! | Cross-role similarity | [`cross_role_similarity`] | 0.0 (fewer than two roles) |
//! | Adjudicated score | [`parse_adjudication`] | 0.5 (call failed / unparseable) |
//!
//! The three are combined with [`ConsensusWeights`] (default 0.3 / 0.3 / 0.4).
//! [`detect_stalemate`] flags a panel that keeps restating itself; it only
//! feeds the advisory [`Recommendation`].

pub mod lexical;
pub mod parsing;
pub mod result;
pub mod scoring;
pub mod similarity;
pub mod stalemate;
mod text;

pub use lexical::lexical_agreement;
pub use parsing::{AdjudicationVerdict, parse_adjudication};
pub use result::{ConsensusResult, Recommendation, ScoreBreakdown};
pub use scoring::ConsensusWeights;
pub use similarity::cross_role_similarity;
pub use stalemate::detect_stalemate;
