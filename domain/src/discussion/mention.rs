//! `@Name` mention parsing.
//!
//! Mentions are matched against role names after normalization: case is
//! ignored and only alphanumeric characters are compared, so `@public_health`
//! resolves to a role named `Public Health`.

use super::role::Role;
use regex::Regex;
use std::sync::LazyLock;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // The leading group keeps e-mail addresses (`a@b.com`) from matching.
    Regex::new(r"(?:^|[^\w@])@([\w][\w\-.]*)").expect("mention regex is valid")
});

/// Normalized form used to match mentions against role names.
///
/// Two roles with the same key cannot be told apart by a mention.
pub fn mention_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Extract the roles mentioned in `content`, in order of first appearance.
///
/// Tokens that do not resolve to a role are ignored. The returned names are
/// the canonical role names, without duplicates.
pub fn extract_mentions(content: &str, roles: &[Role]) -> Vec<String> {
    let mut mentioned: Vec<String> = Vec::new();

    for caps in MENTION_RE.captures_iter(content) {
        let token = mention_key(caps[1].trim_end_matches(['.', '-']));
        if token.is_empty() {
            continue;
        }
        if let Some(role) = roles.iter().find(|r| mention_key(&r.name) == token)
            && !mentioned.contains(&role.name)
        {
            mentioned.push(role.name.clone());
        }
    }

    mentioned
}
