//! Final report for a finished discussion

use crate::cli::commands::OutputFormat;
use colored::Colorize;
use conclave_application::DiscussionSnapshot;
use conclave_domain::{DiscussionEvent, Message};
use serde::Serialize;

/// Everything known about a discussion once it has ended
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionReport {
    pub discussion: DiscussionSnapshot,
    /// The final `discussion_complete` / `discussion_failed` event, if seen
    pub outcome: Option<DiscussionEvent>,
    pub messages: Vec<Message>,
}

/// Formats a [`DiscussionReport`] for console display
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format(report: &DiscussionReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Summary => Self::format_summary(report),
            OutputFormat::Full => Self::format_full(report),
            OutputFormat::Json => Self::format_json(report),
        }
    }

    /// Outcome, scores and the adjudicator's findings
    pub fn format_summary(report: &DiscussionReport) -> String {
        let discussion = &report.discussion;
        let mut output = String::new();

        output.push_str(&Self::header("Panel Discussion Report"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            discussion.topic
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Panel:".cyan().bold(),
            discussion
                .roles
                .iter()
                .map(|r| format!("{} ({})", r.name, r.model))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        output.push_str(&format!(
            "{} {} after {}/{} turn(s), {} message(s)\n",
            "Status:".cyan().bold(),
            discussion.status,
            discussion.current_turn,
            discussion.max_turns,
            discussion.message_count
        ));

        if let Some(consensus) = &discussion.consensus {
            let verdict = if consensus.reached {
                "reached".green().bold()
            } else {
                "not reached".yellow().bold()
            };
            output.push_str(&format!(
                "{} {} (confidence {:.2}: lexical {:.2}, similarity {:.2}, adjudicated {:.2})\n",
                "Consensus:".cyan().bold(),
                verdict,
                consensus.confidence,
                consensus.scores.lexical,
                consensus.scores.similarity,
                consensus.scores.adjudicated
            ));
            output.push_str(&format!(
                "{} {}{}\n",
                "Recommendation:".cyan().bold(),
                consensus.recommendation,
                if consensus.stalemate {
                    " (panel was repeating itself)"
                } else {
                    ""
                }
            ));

            if !consensus.agreements.is_empty() {
                output.push_str(&format!("\n{}\n", "Agreements:".green().bold()));
                for point in &consensus.agreements {
                    output.push_str(&format!("  * {}\n", point));
                }
            }
            if !consensus.disagreements.is_empty() {
                output.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
                for point in &consensus.disagreements {
                    output.push_str(&format!("  * {}\n", point));
                }
            }
        }

        match &report.outcome {
            Some(DiscussionEvent::DiscussionComplete { summary, .. }) => {
                output.push_str(&Self::section_header("Summary"));
                output.push_str(summary);
                output.push('\n');
            }
            Some(DiscussionEvent::DiscussionFailed {
                turn,
                error_class,
                error,
                ..
            }) => {
                output.push_str(&Self::section_header("Failure"));
                output.push_str(&format!(
                    "{} at turn {}: {}\n",
                    error_class.to_string().red().bold(),
                    turn,
                    error
                ));
            }
            _ => {}
        }

        output.push_str(&Self::footer());
        output
    }

    /// Summary followed by the transcript
    pub fn format_full(report: &DiscussionReport) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header("Transcript"));
        for message in &report.messages {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── [turn {}] {} ──", message.turn, message.speaker)
                    .yellow()
                    .bold(),
                message.content
            ));
        }
        output.push('\n');
        output.push_str(&Self::format_summary(report));
        output
    }

    pub fn format_json(report: &DiscussionReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conclave_domain::{
        ConsensusResult, DiscussionId, DiscussionStatus, FailureClass, Recommendation, Role,
        ScoreBreakdown, Speaker,
    };

    fn report(outcome: Option<DiscussionEvent>) -> DiscussionReport {
        let id = DiscussionId::new();
        let messages = vec![Message {
            id: 1,
            discussion_id: id,
            turn: 1,
            speaker: Speaker::Role("Economist".to_string()),
            model: Some("model-a".to_string()),
            content: "Congestion pricing pays for itself.".to_string(),
            mentions: Vec::new(),
            created_at: Utc::now(),
        }];
        DiscussionReport {
            discussion: DiscussionSnapshot {
                id,
                topic: "Car-free city centres".to_string(),
                status: DiscussionStatus::Completed,
                roles: vec![
                    Role::new("Economist", "model-a", "You are Economist."),
                    Role::new("Engineer", "model-b", "You are Engineer."),
                ],
                current_turn: 4,
                max_turns: 10,
                consensus: Some(ConsensusResult {
                    reached: true,
                    confidence: 0.81,
                    summary: Some("Phase it in gradually.".to_string()),
                    evaluated_at_turn: 4,
                    scores: ScoreBreakdown {
                        lexical: 0.7,
                        similarity: 0.6,
                        adjudicated: 0.9,
                    },
                    agreements: vec!["Start with pilot zones".to_string()],
                    disagreements: vec!["Delivery exemptions".to_string()],
                    stalemate: false,
                    recommendation: Recommendation::Conclude,
                }),
                message_count: 1,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            outcome,
            messages,
        }
    }

    fn completed(id: DiscussionId) -> DiscussionEvent {
        DiscussionEvent::DiscussionComplete {
            discussion_id: id,
            turn: 4,
            status: DiscussionStatus::Completed,
            total_turns: 4,
            consensus_reached: true,
            confidence: 0.81,
            summary: "Phase it in gradually.".to_string(),
        }
    }

    // ==================== format_summary ====================

    #[test]
    fn test_summary_contains_outcome() {
        let mut report = report(None);
        report.outcome = Some(completed(report.discussion.id));

        let text = ReportFormatter::format_summary(&report);
        assert!(text.contains("Car-free city centres"));
        assert!(text.contains("Economist (model-a)"));
        assert!(text.contains("completed after 4/10 turn(s)"));
        assert!(text.contains("confidence 0.81"));
        assert!(text.contains("Start with pilot zones"));
        assert!(text.contains("Delivery exemptions"));
        assert!(text.contains("Phase it in gradually."));
        assert!(text.contains("conclude"));
        assert!(!text.contains("repeating itself"));
        // Transcript only appears in the full format
        assert!(!text.contains("Congestion pricing"));
    }

    #[test]
    fn test_summary_flags_stalemate() {
        let mut report = report(None);
        if let Some(consensus) = report.discussion.consensus.as_mut() {
            consensus.reached = false;
            consensus.stalemate = true;
            consensus.recommendation = Recommendation::Escalate;
        }
        let text = ReportFormatter::format_summary(&report);
        assert!(text.contains("escalate (panel was repeating itself)"));
    }

    #[test]
    fn test_summary_reports_failure() {
        let mut report = report(None);
        report.outcome = Some(DiscussionEvent::DiscussionFailed {
            discussion_id: report.discussion.id,
            turn: 3,
            error_class: FailureClass::ProviderTransient,
            error: "Timeout".to_string(),
        });

        let text = ReportFormatter::format_summary(&report);
        assert!(text.contains("provider_transient"));
        assert!(text.contains("at turn 3: Timeout"));
    }

    // ==================== format_full / format_json ====================

    #[test]
    fn test_full_includes_transcript() {
        let report = report(None);
        let text = ReportFormatter::format(&report, OutputFormat::Full);
        assert!(text.contains("[turn 1] Economist"));
        assert!(text.contains("Congestion pricing pays for itself."));
    }

    #[test]
    fn test_json_is_parseable() {
        let mut report = report(None);
        report.outcome = Some(completed(report.discussion.id));

        let json = ReportFormatter::format(&report, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["discussion"]["status"], "completed");
        assert_eq!(value["outcome"]["type"], "discussion_complete");
        assert_eq!(value["messages"][0]["speaker"], "Economist");
    }
}
