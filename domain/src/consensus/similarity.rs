//! Cross-role similarity signal.
//!
//! Takes the latest message of each distinct role in the window and averages
//! the pairwise Jaccard similarity of their word sets. Words shorter than
//! three characters are ignored.

use super::text::words;
use crate::discussion::Message;
use std::collections::HashSet;

const MIN_WORD_LEN: usize = 3;

fn word_set(text: &str) -> HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .collect()
}

/// Jaccard similarity of two word sets; `0.0` if either is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Average pairwise similarity between the latest messages of each role.
///
/// User messages are ignored. Returns `0.0` when fewer than two roles
/// appear in the window.
pub fn cross_role_similarity(window: &[Message]) -> f64 {
    let mut latest: Vec<(&str, &str)> = Vec::new();
    for message in window.iter().rev() {
        if let Some(role) = message.author_role()
            && !latest.iter().any(|(r, _)| *r == role)
        {
            latest.push((role, message.content.as_str()));
        }
    }

    if latest.len() < 2 {
        return 0.0;
    }

    let sets: Vec<HashSet<String>> = latest.iter().map(|(_, text)| word_set(text)).collect();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            total += jaccard(&sets[i], &sets[j]);
            pairs += 1;
        }
    }

    total / pairs as f64
}
