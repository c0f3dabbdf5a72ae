//! Lexical agreement signal.
//!
//! Counts agreement-indicating and disagreement-indicating terms across a
//! window of messages. A single agreement word directly preceded by a negator
//! (`don't agree`, `not aligned`) counts as disagreement.

use super::text::words;

const AGREEMENT_WORDS: &[&str] = &[
    "agree",
    "agreed",
    "agrees",
    "agreement",
    "concur",
    "concurs",
    "consensus",
    "aligned",
    "endorse",
    "exactly",
    "absolutely",
    "support",
    "supports",
];

const AGREEMENT_PHRASES: &[&str] = &[
    "good point",
    "fair point",
    "well said",
    "makes sense",
    "common ground",
    "on the same page",
    "you're right",
];

const DISAGREEMENT_WORDS: &[&str] = &[
    "disagree",
    "disagrees",
    "disagreement",
    "however",
    "oppose",
    "object",
    "objection",
    "doubt",
    "skeptical",
    "unconvinced",
    "wrong",
    "incorrect",
    "flawed",
    "dispute",
    "reject",
];

const DISAGREEMENT_PHRASES: &[&str] = &[
    "not convinced",
    "on the contrary",
    "i don't think",
    "push back",
    "not so sure",
];

const NEGATORS: &[&str] = &["not", "don't", "dont", "never", "cannot", "can't", "no"];

/// Count `(agreement, disagreement)` terms in one text.
pub fn count_terms(text: &str) -> (usize, usize) {
    let tokens = words(text);
    let mut agree = 0;
    let mut disagree = 0;

    for (i, token) in tokens.iter().enumerate() {
        let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
        if AGREEMENT_WORDS.contains(&token.as_str()) {
            if negated {
                disagree += 1;
            } else {
                agree += 1;
            }
        } else if DISAGREEMENT_WORDS.contains(&token.as_str()) {
            disagree += 1;
        }
    }

    let joined = format!(" {} ", tokens.join(" "));
    agree += AGREEMENT_PHRASES
        .iter()
        .map(|p| joined.matches(&format!(" {} ", p)).count())
        .sum::<usize>();
    disagree += DISAGREEMENT_PHRASES
        .iter()
        .map(|p| joined.matches(&format!(" {} ", p)).count())
        .sum::<usize>();

    (agree, disagree)
}

/// Ratio of agreement terms to all indicator terms across `texts`.
///
/// - `1.0` when only agreement terms occur
/// - `0.0` when only disagreement terms occur
/// - `0.5` when neither occurs
pub fn lexical_agreement<'a>(texts: impl IntoIterator<Item = &'a str>) -> f64 {
    let (agree, disagree) = texts
        .into_iter()
        .map(count_terms)
        .fold((0, 0), |(a, d), (x, y)| (a + x, d + y));

    match (agree, disagree) {
        (0, 0) => 0.5,
        (a, d) => a as f64 / (a + d) as f64,
    }
}
