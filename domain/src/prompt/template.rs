//! Prompt templates for the discussion flow

use crate::consensus::ConsensusResult;
use crate::core::string::{single_line, truncate};
use crate::discussion::{Message, Role};

/// Characters of each message shown to the speaker selector
const SELECTION_PREVIEW_LEN: usize = 200;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    // ==================== Discussion turns ====================

    /// Instruction appended after the transcript window for a speaking role
    pub fn turn_instruction(topic: &str, speaker: &Role, roles: &[Role]) -> String {
        let others: Vec<String> = roles
            .iter()
            .filter(|r| r.name != speaker.name)
            .map(|r| {
                if r.description.is_empty() {
                    format!("- {}", r.name)
                } else {
                    format!("- {}: {}", r.name, r.description)
                }
            })
            .collect();

        format!(
            r#"Discussion topic: {}

You are {}. The other participants are:
{}

Continue the discussion with your next contribution. Respond to what was just said,
build on points you agree with and challenge points you disagree with.
Address another participant directly with @Name when you want their response.
Keep it under 200 words and do not prefix your reply with your name."#,
            topic,
            speaker.name,
            others.join("\n")
        )
    }

    /// Render transcript messages as `[Speaker]: content` blocks
    pub fn format_transcript(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| format!("[{}] (turn {}): {}", m.speaker, m.turn, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    // ==================== Speaker selection ====================

    /// System prompt for the speaker selection hint
    pub fn selection_system() -> &'static str {
        r#"You moderate a multi-expert panel discussion.
Your only task is to decide which participant should speak next.
Answer with the participant's name exactly as listed and nothing else."#
    }

    /// User prompt for the speaker selection hint
    pub fn selection_prompt(
        topic: &str,
        roles: &[Role],
        recent: &[Message],
        previous: Option<&str>,
    ) -> String {
        let participants: Vec<String> = roles
            .iter()
            .map(|r| {
                if r.description.is_empty() {
                    format!("- {}", r.name)
                } else {
                    format!("- {}: {}", r.name, r.description)
                }
            })
            .collect();

        let conversation: Vec<String> = recent
            .iter()
            .map(|m| {
                format!(
                    "{}: {}",
                    m.speaker,
                    truncate(&single_line(&m.content), SELECTION_PREVIEW_LEN)
                )
            })
            .collect();

        let mut prompt = format!(
            r#"Topic: {}

Available participants:
{}

Recent conversation:
{}
"#,
            topic,
            participants.join("\n"),
            conversation.join("\n")
        );

        if let Some(previous) = previous {
            prompt.push_str(&format!(
                "\n{} just spoke and cannot speak again immediately.\n",
                previous
            ));
        }

        prompt.push_str(
            r#"
Pick whoever should logically respond next, considering what was just discussed,
whose expertise is most relevant and the natural flow of conversation.
Return ONLY the participant's name."#,
        );

        prompt
    }

    // ==================== Consensus adjudication ====================

    /// System prompt for the consensus adjudicator
    pub fn adjudication_system() -> &'static str {
        r#"You are a neutral analyst assessing whether a panel discussion has converged.
Judge only the participants' positions, not the quality of their arguments.
Always answer with a single JSON object."#
    }

    /// User prompt for the consensus adjudicator
    pub fn adjudication_prompt(topic: &str, window: &[Message]) -> String {
        format!(
            r#"Topic: {}

Recent conversation:
{}

Evaluate:
1. Are the participants converging on a shared position?
2. What are the key points of agreement?
3. What disagreements remain?
4. How converged is the panel, from 0.0 (no agreement) to 1.0 (full agreement)?

Return JSON with:
{{
  "confidence": <float 0-1>,
  "summary": "<brief summary of the shared position or current state>",
  "agreements": ["point 1", "point 2"],
  "disagreements": ["issue 1"]
}}"#,
            topic,
            Self::format_transcript(window)
        )
    }

    // ==================== Closing summary ====================

    /// System prompt for the end-of-discussion summary
    pub fn final_summary_system() -> &'static str {
        r#"You write concise closing summaries of panel discussions.
Report what the participants concluded, not your own opinion.
Answer in plain prose without a heading."#
    }

    /// User prompt for the end-of-discussion summary
    pub fn final_summary_prompt(
        topic: &str,
        messages: &[Message],
        consensus: Option<&ConsensusResult>,
    ) -> String {
        let status = match consensus {
            Some(c) if c.reached => format!("reached (confidence {:.0}%)", c.confidence * 100.0),
            Some(c) => format!("not reached (confidence {:.0}%)", c.confidence * 100.0),
            None => "not evaluated".to_string(),
        };
        let (agreements, disagreements) = match consensus {
            Some(c) => (bullet_list(&c.agreements), bullet_list(&c.disagreements)),
            None => (bullet_list(&[]), bullet_list(&[])),
        };

        format!(
            r#"Topic: {}

Consensus: {}

Full conversation:
{}

Key agreements:
{}

Remaining disagreements:
{}

Provide:
1. An executive summary in two or three sentences
2. The main conclusions
3. Recommended next steps, if any

Keep it concise and actionable."#,
            topic,
            status,
            Self::format_transcript(messages),
            agreements,
            disagreements
        )
    }

    /// Summary used when consensus is reached but the adjudicator gave none
    pub fn fallback_summary(topic: &str, confidence: f64) -> String {
        format!(
            "The panel converged on \"{}\" with confidence {:.2}.",
            topic, confidence
        )
    }

    /// Summary used when the turn budget ran out without consensus
    pub fn unresolved_summary(topic: &str, confidence: f64) -> String {
        format!(
            "The panel did not reach consensus on \"{}\" (final confidence {:.2}).",
            topic, confidence
        )
    }

    /// Summary used when the discussion was stopped on request
    pub fn stopped_summary(topic: &str, turns: u32) -> String {
        format!(
            "The discussion on \"{}\" was stopped after {} turn(s).",
            topic, turns
        )
    }
}

fn bullet_list(points: &[String]) -> String {
    if points.is_empty() {
        return "- none".to_string();
    }
    points
        .iter()
        .map(|p| format!("- {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}
