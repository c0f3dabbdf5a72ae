//! Consensus detection use case
//!
//! Scores the trailing window of agent messages after each turn. The
//! detector only computes a [`ConsensusResult`]; the orchestrator decides
//! what to do with it.
//!
//! ```text
//! agent messages < 2 × roles ──▶ below floor (reached = false, 0.0)
//! otherwise:
//!   window = last max(W, roles) agent messages
//!   lexical ─┐
//!   similarity ─┼─▶ weighted average ─▶ reached = confidence ≥ threshold
//!   adjudicated ┘   (0.5 on failure)
//!   stalemate (last 6 agent messages) ──▶ advisory recommendation
//! ```
//!
//! When a discussion ends, [`ConsensusDetector::summarize`] asks the same
//! model for a closing summary. Failure there is never fatal; the caller
//! falls back to a template.

use crate::config::ConsensusConfig;
use crate::ports::llm_gateway::{CompletionRequest, LlmGateway};
use conclave_domain::{
    AdjudicationVerdict, ConsensusResult, Message, PromptTemplate, Recommendation, Role,
    ScoreBreakdown, cross_role_similarity, detect_stalemate, lexical_agreement,
    parse_adjudication,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Score used when adjudication fails or cannot be parsed
const NEUTRAL_SCORE: f64 = 0.5;

pub struct ConsensusDetector<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    config: ConsensusConfig,
}

impl<G: LlmGateway + 'static> ConsensusDetector<G> {
    pub fn new(gateway: Arc<G>, config: ConsensusConfig) -> Self {
        Self { gateway, config }
    }

    /// Minimum number of agent messages before evaluation starts
    pub fn min_messages(role_count: usize) -> usize {
        2 * role_count
    }

    fn window_size(&self, role_count: usize) -> usize {
        self.config.window.max(role_count)
    }

    /// Evaluate the transcript as of `turn`.
    pub async fn evaluate(
        &self,
        topic: &str,
        roles: &[Role],
        history: &[Message],
        turn: u32,
    ) -> ConsensusResult {
        let agent_messages: Vec<Message> =
            history.iter().filter(|m| !m.is_user()).cloned().collect();
        if agent_messages.len() < Self::min_messages(roles.len()) {
            return ConsensusResult::below_floor(turn);
        }

        let start = agent_messages
            .len()
            .saturating_sub(self.window_size(roles.len()));
        let window = &agent_messages[start..];

        let lexical = lexical_agreement(window.iter().map(|m| m.content.as_str()));
        let similarity = cross_role_similarity(window);
        let verdict = self.adjudicate(topic, window).await;

        let scores = ScoreBreakdown {
            lexical,
            similarity,
            adjudicated: verdict
                .as_ref()
                .map(|v| v.confidence)
                .unwrap_or(NEUTRAL_SCORE),
        };
        let confidence = self.config.weights.combine(&scores);
        let reached = confidence >= self.config.threshold;
        let stalemate = detect_stalemate(&agent_messages);

        let (summary, agreements, disagreements) = match verdict {
            Some(v) => (v.summary, v.agreements, v.disagreements),
            None => (None, Vec::new(), Vec::new()),
        };
        let recommendation =
            Recommendation::advise(reached, stalemate, &agreements, &disagreements);

        debug!(
            turn,
            lexical, similarity,
            adjudicated = scores.adjudicated,
            confidence,
            reached,
            stalemate,
            %recommendation,
            "Consensus evaluated"
        );

        let summary = reached.then(|| {
            summary.unwrap_or_else(|| PromptTemplate::fallback_summary(topic, confidence))
        });

        ConsensusResult {
            reached,
            confidence,
            summary,
            evaluated_at_turn: turn,
            scores,
            agreements,
            disagreements,
            stalemate,
            recommendation,
        }
    }

    /// Closing summary of the whole transcript, or `None` if disabled, the
    /// call fails, times out or returns nothing.
    pub async fn summarize(
        &self,
        topic: &str,
        history: &[Message],
        consensus: Option<&ConsensusResult>,
    ) -> Option<String> {
        if !self.config.final_summary {
            return None;
        }
        let request = CompletionRequest::new(
            self.config.model.clone(),
            PromptTemplate::final_summary_system(),
            PromptTemplate::final_summary_prompt(topic, history, consensus),
        )
        .with_temperature(0.3)
        .with_max_tokens(Some(600));

        match tokio::time::timeout(self.config.timeout, self.gateway.complete(&request)).await {
            Ok(Ok(response)) => {
                let summary = response.trim();
                if summary.is_empty() {
                    warn!("Empty closing summary, using template");
                    None
                } else {
                    Some(summary.to_string())
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Closing summary call failed, using template");
                None
            }
            Err(_) => {
                warn!("Closing summary call timed out, using template");
                None
            }
        }
    }

    async fn adjudicate(&self, topic: &str, window: &[Message]) -> Option<AdjudicationVerdict> {
        let request = CompletionRequest::new(
            self.config.model.clone(),
            PromptTemplate::adjudication_system(),
            PromptTemplate::adjudication_prompt(topic, window),
        )
        .with_temperature(0.2)
        .with_max_tokens(Some(400));

        match tokio::time::timeout(self.config.timeout, self.gateway.complete(&request)).await {
            Ok(Ok(response)) => {
                let verdict = parse_adjudication(&response);
                if verdict.is_none() {
                    warn!("Unparseable adjudication response, using neutral score");
                }
                verdict
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Adjudication call failed, using neutral score");
                None
            }
            Err(_) => {
                warn!("Adjudication call timed out, using neutral score");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use async_trait::async_trait;
    use chrono::Utc;
    use conclave_domain::{DiscussionId, Speaker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test Mocks ====================

    struct FixedAdjudicator {
        response: Result<String, GatewayError>,
        calls: AtomicUsize,
    }

    impl FixedAdjudicator {
        fn new(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(GatewayError::ConnectionError("down".into())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for FixedAdjudicator {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    struct StalledAdjudicator;

    #[async_trait]
    impl LlmGateway for StalledAdjudicator {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    fn roles(n: usize) -> Vec<Role> {
        (0..n)
            .map(|i| Role::new(format!("R{}", i), "m", "p"))
            .collect()
    }

    fn transcript(contents: &[&str], role_count: usize) -> Vec<Message> {
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| Message {
                id: i as u64 + 1,
                discussion_id: DiscussionId::new(),
                turn: i as u32 + 1,
                speaker: Speaker::Role(format!("R{}", i % role_count)),
                model: None,
                content: content.to_string(),
                mentions: vec![],
                created_at: Utc::now(),
            })
            .collect()
    }

    fn detector<G: LlmGateway + 'static>(gateway: G) -> ConsensusDetector<G> {
        ConsensusDetector::new(Arc::new(gateway), ConsensusConfig::default())
    }

    // ==================== Floor ====================

    #[tokio::test]
    async fn test_below_floor_never_reached() {
        let det = detector(FixedAdjudicator::new(r#"{"confidence": 1.0}"#));
        let cast = roles(3);
        let history = transcript(&["I agree completely."; 5], 3);

        let result = det.evaluate("T", &cast, &history, 5).await;
        assert!(!result.reached);
        assert_eq!(result.confidence, 0.0);
        assert!(result.summary.is_none());
        assert_eq!(det.gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_user_messages_do_not_count_toward_floor() {
        let det = detector(FixedAdjudicator::new(r#"{"confidence": 1.0}"#));
        let cast = roles(2);
        let mut history = transcript(&["I agree.", "I agree.", "I agree."], 2);
        history.push(Message {
            speaker: Speaker::User,
            ..history[0].clone()
        });
        let result = det.evaluate("T", &cast, &history, 3).await;
        assert_eq!(result, ConsensusResult::below_floor(3));
    }

    // ==================== Scoring ====================

    #[tokio::test]
    async fn test_agreeing_panel_reaches_consensus() {
        let det = detector(FixedAdjudicator::new(
            r#"{"confidence": 0.9, "summary": "Everyone backs carbon pricing", "agreements": ["carbon pricing"]}"#,
        ));
        let cast = roles(2);
        let text = "I agree, carbon pricing is the right policy.";
        let history = transcript(&[text; 4], 2);

        let result = det.evaluate("Climate", &cast, &history, 4).await;
        assert!(result.reached);
        assert_eq!(result.scores.lexical, 1.0);
        assert_eq!(result.scores.similarity, 1.0);
        assert_eq!(result.scores.adjudicated, 0.9);
        assert!((result.confidence - 0.96).abs() < 1e-9);
        assert_eq!(
            result.summary.as_deref(),
            Some("Everyone backs carbon pricing")
        );
        assert_eq!(result.agreements, vec!["carbon pricing"]);
        assert_eq!(result.evaluated_at_turn, 4);
    }

    #[tokio::test]
    async fn test_reached_without_rationale_uses_fallback_summary() {
        let det = detector(FixedAdjudicator::new("Confidence: 0.8"));
        let cast = roles(2);
        let history = transcript(&["I agree, same plan."; 4], 2);

        let result = det.evaluate("Climate", &cast, &history, 4).await;
        assert!(result.reached);
        let summary = result.summary.unwrap();
        assert!(summary.contains("Climate"));
    }

    #[tokio::test]
    async fn test_divergent_panel_not_reached() {
        let det = detector(FixedAdjudicator::new(r#"{"confidence": 0.1, "summary": "split"}"#));
        let cast = roles(2);
        let history = transcript(
            &[
                "I disagree, nuclear is wrong for us.",
                "No, solar panels fail in winter.",
                "I disagree with wind subsidies entirely.",
                "Hydro dams harm rivers, that is incorrect policy.",
            ],
            2,
        );
        let result = det.evaluate("Energy", &cast, &history, 4).await;
        assert!(!result.reached);
        assert!(result.summary.is_none());
        assert!(result.confidence < 0.75);
    }

    #[tokio::test]
    async fn test_adjudication_failure_is_neutral() {
        let det = detector(FixedAdjudicator::failing());
        let cast = roles(2);
        let history = transcript(&["Plain statement here."; 4], 2);
        let result = det.evaluate("T", &cast, &history, 4).await;
        assert_eq!(result.scores.adjudicated, 0.5);
        assert_eq!(result.scores.lexical, 0.5);
    }

    #[tokio::test]
    async fn test_unparseable_adjudication_is_neutral() {
        let det = detector(FixedAdjudicator::new("They mostly line up"));
        let cast = roles(2);
        let history = transcript(&["Plain statement here."; 4], 2);
        let result = det.evaluate("T", &cast, &history, 4).await;
        assert_eq!(result.scores.adjudicated, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adjudication_timeout_is_neutral() {
        let config = ConsensusConfig {
            timeout: Duration::from_millis(100),
            ..ConsensusConfig::default()
        };
        let det = ConsensusDetector::new(Arc::new(StalledAdjudicator), config);
        let cast = roles(2);
        let history = transcript(&["Plain statement here."; 4], 2);
        let result = det.evaluate("T", &cast, &history, 4).await;
        assert_eq!(result.scores.adjudicated, 0.5);
    }

    #[tokio::test]
    async fn test_window_covers_at_least_all_roles() {
        let config = ConsensusConfig {
            window: 1,
            ..ConsensusConfig::default()
        };
        let det = ConsensusDetector::new(Arc::new(FixedAdjudicator::new("0.5")), config);
        let cast = roles(3);
        let history = transcript(
            &[
                "alpha beta gamma",
                "alpha beta gamma",
                "alpha beta gamma",
                "alpha beta gamma",
                "alpha beta gamma",
                "alpha beta gamma",
            ],
            3,
        );
        // A one-message window would give no cross-role pairs
        let result = det.evaluate("T", &cast, &history, 6).await;
        assert_eq!(result.scores.similarity, 1.0);
    }

    // ==================== Stalemate ====================

    #[tokio::test]
    async fn test_repeating_panel_escalates_without_ending() {
        let det = detector(FixedAdjudicator::new(r#"{"confidence": 0.1}"#));
        let cast = roles(2);
        let history = transcript(&["Carbon pricing remains my position on this."; 6], 2);

        let result = det.evaluate("Climate", &cast, &history, 6).await;
        assert!(result.stalemate);
        assert!(!result.reached);
        assert_eq!(result.recommendation, Recommendation::Escalate);
    }

    #[tokio::test]
    async fn test_open_disagreement_continues() {
        let det = detector(FixedAdjudicator::new(
            r#"{"confidence": 0.3, "agreements": ["targets"], "disagreements": ["timeline"]}"#,
        ));
        let cast = roles(2);
        let history = transcript(
            &[
                "Nuclear first, then renewables.",
                "Renewables first, nuclear is slow.",
                "Timelines favour reactors.",
                "Solar builds faster than reactors.",
            ],
            2,
        );
        let result = det.evaluate("Energy", &cast, &history, 4).await;
        assert!(!result.stalemate);
        assert_eq!(result.recommendation, Recommendation::Continue);
    }

    // ==================== Closing summary ====================

    #[tokio::test]
    async fn test_summarize_uses_model_text() {
        let det = detector(FixedAdjudicator::new("  Pilot zones first, then expand.  "));
        let history = transcript(&["Pilot zones first."; 2], 2);
        let summary = det.summarize("Cities", &history, None).await;
        assert_eq!(summary.as_deref(), Some("Pilot zones first, then expand."));
    }

    #[tokio::test]
    async fn test_summarize_failure_or_empty_is_none() {
        let history = transcript(&["Pilot zones first."; 2], 2);
        let det = detector(FixedAdjudicator::failing());
        assert!(det.summarize("Cities", &history, None).await.is_none());

        let det = detector(FixedAdjudicator::new("   "));
        assert!(det.summarize("Cities", &history, None).await.is_none());
    }

    #[tokio::test]
    async fn test_summarize_disabled_skips_call() {
        let config = ConsensusConfig {
            final_summary: false,
            ..ConsensusConfig::default()
        };
        let det = ConsensusDetector::new(Arc::new(FixedAdjudicator::new("text")), config);
        let history = transcript(&["Pilot zones first."; 2], 2);
        assert!(det.summarize("Cities", &history, None).await.is_none());
        assert_eq!(det.gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summarize_timeout_is_none() {
        let config = ConsensusConfig {
            timeout: Duration::from_millis(100),
            ..ConsensusConfig::default()
        };
        let det = ConsensusDetector::new(Arc::new(StalledAdjudicator), config);
        let history = transcript(&["Pilot zones first."; 2], 2);
        assert!(det.summarize("Cities", &history, None).await.is_none());
    }

    // ==================== Monotonicity ====================

    #[tokio::test]
    async fn test_replacing_disagreement_never_lowers_confidence() {
        let cast = roles(2);
        let divergent = [
            "I disagree about taxes on fuel.",
            "I disagree about subsidies for farms.",
            "We disagree about timelines here.",
            "I disagree about regional quotas.",
        ];
        let converted: Vec<String> = divergent
            .iter()
            .map(|t| t.replace("disagree", "agree"))
            .collect();
        let converted: Vec<&str> = converted.iter().map(String::as_str).collect();

        let det = detector(FixedAdjudicator::new(r#"{"confidence": 0.4}"#));
        let before = det
            .evaluate("T", &cast, &transcript(&divergent, 2), 4)
            .await;
        let after = det
            .evaluate("T", &cast, &transcript(&converted, 2), 4)
            .await;

        assert!(after.confidence >= before.confidence);
        assert!(after.scores.lexical > before.scores.lexical);
        assert_eq!(after.scores.similarity, before.scores.similarity);
    }
}
