//! Speaker selection policy
//!
//! Deterministic building blocks for choosing the next speaker. The
//! model-assisted hint is requested by the application layer; everything
//! here is pure and reproducible.
//!
//! # Priority
//!
//! 1. [`mention_target`]: the first role `@mentioned` in the latest message
//! 2. [`validate_model_choice`]: a model's answer, if it names a valid role
//! 3. [`round_robin_after`]: the next role after the previous speaker
//!
//! Every step refuses the previous speaker when more than one role exists,
//! so no role ever speaks twice in a row.

use crate::discussion::{Message, Role};
use serde::{Deserialize, Serialize};

/// Which rule produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Mention,
    Model,
    RoundRobin,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionSource::Mention => "mention",
            SelectionSource::Model => "model",
            SelectionSource::RoundRobin => "round_robin",
        }
    }
}

impl std::fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn is_blocked(candidate: &str, previous: Option<&str>, roles: &[Role]) -> bool {
    roles.len() > 1 && previous == Some(candidate)
}

/// First role mentioned in `last` that is neither its author nor the
/// previous speaker.
///
/// Self-mentions and mentions of the previous speaker are skipped rather
/// than honoured.
pub fn mention_target<'a>(
    last: Option<&Message>,
    roles: &'a [Role],
    previous: Option<&str>,
) -> Option<&'a Role> {
    let last = last?;
    let author = last.author_role();

    last.mentions
        .iter()
        .filter(|name| Some(name.as_str()) != author)
        .filter(|name| !is_blocked(name, previous, roles))
        .find_map(|name| roles.iter().find(|r| &r.name == name))
}

/// Accept a model's answer only if it is exactly a role name.
///
/// Surrounding whitespace, quotes and a trailing period are tolerated; the
/// previous speaker is rejected unless it is the only role.
pub fn validate_model_choice<'a>(
    answer: &str,
    roles: &'a [Role],
    previous: Option<&str>,
) -> Option<&'a Role> {
    let name = answer
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim();

    roles
        .iter()
        .find(|r| r.name == name)
        .filter(|r| !is_blocked(&r.name, previous, roles))
}

/// The role after `previous` in roster order, wrapping around.
///
/// With no previous speaker the first role is chosen. Returns `None` only
/// for an empty roster.
pub fn round_robin_after<'a>(roles: &'a [Role], previous: Option<&str>) -> Option<&'a Role> {
    let next = previous
        .and_then(|name| roles.iter().position(|r| r.name == name))
        .map(|idx| (idx + 1) % roles.len())
        .unwrap_or(0);
    roles.get(next)
}
