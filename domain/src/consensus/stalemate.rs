//! Stalemate heuristic.
//!
//! A panel is considered stuck when its most recent agent messages keep
//! restating each other: among the last [`STALEMATE_WINDOW`] agent messages,
//! more than [`STALEMATE_PAIRS`] pairs overlap by more than
//! [`STALEMATE_SIMILARITY`] (word-set Jaccard).

use super::similarity::jaccard;
use super::text::words;
use crate::discussion::Message;
use std::collections::HashSet;

pub const STALEMATE_WINDOW: usize = 6;
pub const STALEMATE_SIMILARITY: f64 = 0.7;
pub const STALEMATE_PAIRS: usize = 2;

/// Whether the trailing agent messages repeat each other.
///
/// User messages are skipped. Fewer than [`STALEMATE_WINDOW`] agent
/// messages never count as a stalemate.
pub fn detect_stalemate(history: &[Message]) -> bool {
    let recent: Vec<HashSet<String>> = history
        .iter()
        .rev()
        .filter(|m| !m.is_user())
        .take(STALEMATE_WINDOW)
        .map(|m| words(&m.content).into_iter().collect())
        .collect();
    if recent.len() < STALEMATE_WINDOW {
        return false;
    }

    let mut similar = 0;
    for i in 0..recent.len() {
        for j in (i + 1)..recent.len() {
            if jaccard(&recent[i], &recent[j]) > STALEMATE_SIMILARITY {
                similar += 1;
            }
        }
    }
    similar > STALEMATE_PAIRS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discussion::{DiscussionId, Speaker};
    use chrono::Utc;

    fn history(contents: &[&str]) -> Vec<Message> {
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| Message {
                id: i as u64 + 1,
                discussion_id: DiscussionId::new(),
                turn: i as u32 + 1,
                speaker: Speaker::Role(if i % 2 == 0 { "A" } else { "B" }.to_string()),
                model: None,
                content: content.to_string(),
                mentions: vec![],
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_repetition_is_stalemate() {
        let h = history(&["we must tax carbon now"; 6]);
        assert!(detect_stalemate(&h));
    }

    #[test]
    fn test_short_history_is_not_stalemate() {
        let h = history(&["we must tax carbon now"; 5]);
        assert!(!detect_stalemate(&h));
    }

    #[test]
    fn test_varied_discussion_is_not_stalemate() {
        let h = history(&[
            "nuclear gives steady baseload",
            "solar is cheaper during the day",
            "wind output peaks in winter",
            "storage smooths the daily curve",
            "grid upgrades come first",
            "demand response reduces peaks",
        ]);
        assert!(!detect_stalemate(&h));
    }

    #[test]
    fn test_user_messages_are_skipped() {
        let mut h = history(&["we must tax carbon now"; 6]);
        h.push(Message {
            speaker: Speaker::User,
            content: "completely different words entirely".to_string(),
            ..h[0].clone()
        });
        assert!(detect_stalemate(&h));
    }
}
