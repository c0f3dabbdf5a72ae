//! Weighted combination of consensus signals

use super::result::ScoreBreakdown;
use serde::{Deserialize, Serialize};

/// Fixed weights applied to the three consensus signals.
///
/// Weights need not sum to one; the combination is normalized by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusWeights {
    pub lexical: f64,
    pub similarity: f64,
    pub adjudicated: f64,
}

impl Default for ConsensusWeights {
    fn default() -> Self {
        Self {
            lexical: 0.3,
            similarity: 0.3,
            adjudicated: 0.4,
        }
    }
}

impl ConsensusWeights {
    pub fn total(&self) -> f64 {
        self.lexical + self.similarity + self.adjudicated
    }

    /// All weights non-negative and at least one positive
    pub fn is_valid(&self) -> bool {
        self.lexical >= 0.0 && self.similarity >= 0.0 && self.adjudicated >= 0.0 && self.total() > 0.0
    }

    /// Weighted average of `scores`, clamped to `[0, 1]`.
    ///
    /// Invalid weights fall back to the defaults.
    pub fn combine(&self, scores: &ScoreBreakdown) -> f64 {
        let weights = if self.is_valid() { *self } else { Self::default() };
        let weighted = weights.lexical * scores.lexical
            + weights.similarity * scores.similarity
            + weights.adjudicated * scores.adjudicated;
        (weighted / weights.total()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let scores = ScoreBreakdown {
            lexical: 1.0,
            similarity: 1.0,
            adjudicated: 0.5,
        };
        let confidence = ConsensusWeights::default().combine(&scores);
        assert!((confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_unnormalized_weights() {
        let weights = ConsensusWeights {
            lexical: 1.0,
            similarity: 1.0,
            adjudicated: 2.0,
        };
        let scores = ScoreBreakdown {
            lexical: 0.0,
            similarity: 0.0,
            adjudicated: 1.0,
        };
        assert!((weights.combine(&scores) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_weights_fall_back() {
        let weights = ConsensusWeights {
            lexical: 0.0,
            similarity: 0.0,
            adjudicated: 0.0,
        };
        assert!(!weights.is_valid());
        let scores = ScoreBreakdown {
            lexical: 1.0,
            similarity: 0.0,
            adjudicated: 0.0,
        };
        assert!((weights.combine(&scores) - 0.3).abs() < 1e-9);
    }
}
