//! Consensus evaluation result

use serde::{Deserialize, Serialize};

/// Component scores behind a confidence value, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub lexical: f64,
    pub similarity: f64,
    pub adjudicated: f64,
}

/// What the evaluation suggests doing next.
///
/// Advisory only: the turn loop ends on `reached` or on the turn budget,
/// never on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    #[default]
    Continue,
    Conclude,
    /// The panel is going in circles and needs outside input
    Escalate,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Continue => "continue",
            Recommendation::Conclude => "conclude",
            Recommendation::Escalate => "escalate",
        }
    }
}

impl Recommendation {
    /// Advice for an evaluated window.
    ///
    /// Consensus concludes; a stalemate escalates; an adjudicator that
    /// lists agreements and no open disagreements also concludes.
    pub fn advise(reached: bool, stalemate: bool, agreements: &[String], disagreements: &[String]) -> Self {
        if reached {
            Recommendation::Conclude
        } else if stalemate {
            Recommendation::Escalate
        } else if !agreements.is_empty() && disagreements.is_empty() {
            Recommendation::Conclude
        } else {
            Recommendation::Continue
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one consensus evaluation.
///
/// Recomputed after every agent turn; a discussion keeps only the latest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub reached: bool,
    /// Weighted confidence in `[0, 1]`
    pub confidence: f64,
    /// Only present when `reached` is true
    pub summary: Option<String>,
    /// Turn counter at the time of evaluation
    pub evaluated_at_turn: u32,
    pub scores: ScoreBreakdown,
    /// Points of agreement reported by the adjudicator
    #[serde(default)]
    pub agreements: Vec<String>,
    /// Remaining disagreements reported by the adjudicator
    #[serde(default)]
    pub disagreements: Vec<String>,
    /// Trailing agent messages keep repeating each other
    #[serde(default)]
    pub stalemate: bool,
    #[serde(default)]
    pub recommendation: Recommendation,
}

impl ConsensusResult {
    /// Result for a transcript still below the minimum message floor
    pub fn below_floor(turn: u32) -> Self {
        Self {
            reached: false,
            confidence: 0.0,
            summary: None,
            evaluated_at_turn: turn,
            scores: ScoreBreakdown::default(),
            agreements: Vec::new(),
            disagreements: Vec::new(),
            stalemate: false,
            recommendation: Recommendation::Continue,
        }
    }
}
