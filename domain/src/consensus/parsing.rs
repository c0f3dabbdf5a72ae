//! Adjudication response parsing.
//!
//! The adjudicator is asked for JSON, but models do not always comply, so
//! the parser accepts a few shapes and gives up (returns `None`) otherwise.
//!
//! # Supported Formats
//!
//! 1. **JSON** (preferred): `{"confidence": 0.8, "summary": "...", "agreements": [...], "disagreements": [...]}`
//! 2. **Labelled value**: `Confidence: 0.8`
//! 3. **Percentage**: `80%`
//! 4. **Standalone number** in `[0, 1]`

use serde_json::Value;

/// Parsed adjudicator answer
#[derive(Debug, Clone, PartialEq)]
pub struct AdjudicationVerdict {
    /// Convergence rating in `[0, 1]`
    pub confidence: f64,
    /// Rationale, if the adjudicator gave one
    pub summary: Option<String>,
    pub agreements: Vec<String>,
    pub disagreements: Vec<String>,
}

impl AdjudicationVerdict {
    fn score_only(confidence: f64) -> Self {
        Self {
            confidence,
            summary: None,
            agreements: Vec::new(),
            disagreements: Vec::new(),
        }
    }
}

/// Normalize a raw rating: `[0, 1]` as is, `(1, 100]` as a percentage.
fn normalize_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        None
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_json(response: &str) -> Option<AdjudicationVerdict> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: Value = serde_json::from_str(&response[start..=end]).ok()?;

    let raw = match parsed.get("confidence")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };

    let summary = parsed
        .get("summary")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Some(AdjudicationVerdict {
        confidence: normalize_score(raw)?,
        summary,
        agreements: string_list(parsed.get("agreements")),
        disagreements: string_list(parsed.get("disagreements")),
    })
}

fn parse_plain(response: &str) -> Option<f64> {
    let lower = response.to_lowercase();

    // "confidence: 0.8" takes precedence over stray numbers
    if let Some(pos) = lower.find("confidence") {
        let rest = &lower[pos + "confidence".len()..];
        if let Some(word) = rest
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| c == ':' || c == '=' || c == ','))
            .find(|w| !w.is_empty())
            && let Some(score) = parse_number(word)
        {
            return Some(score);
        }
    }

    for word in lower.split_whitespace() {
        if let Some(pct) = word.trim_end_matches(['.', ',']).strip_suffix('%')
            && let Ok(num) = pct.parse::<f64>()
            && (0.0..=100.0).contains(&num)
        {
            return Some(num / 100.0);
        }
    }

    lower
        .split_whitespace()
        .filter_map(|w| {
            w.trim_matches(|c: char| !(c.is_ascii_digit() || c == '.'))
                .trim_end_matches('.')
                .parse::<f64>()
                .ok()
        })
        .find(|n| (0.0..=1.0).contains(n))
}

fn parse_number(word: &str) -> Option<f64> {
    let word = word.trim_end_matches(['.', ',']);
    if let Some(pct) = word.strip_suffix('%') {
        return pct
            .parse::<f64>()
            .ok()
            .filter(|n| (0.0..=100.0).contains(n))
            .map(|n| n / 100.0);
    }
    word.parse::<f64>().ok().and_then(normalize_score)
}

/// Parse the adjudicator's answer.
///
/// Returns `None` when no rating can be recovered; callers treat that as
/// the neutral score `0.5`.
///
/// # Examples
///
/// ```
/// use conclave_domain::consensus::parse_adjudication;
///
/// let v = parse_adjudication(r#"{"confidence": 0.9, "summary": "Aligned"}"#).unwrap();
/// assert_eq!(v.confidence, 0.9);
/// assert_eq!(v.summary.as_deref(), Some("Aligned"));
/// assert_eq!(parse_adjudication("Confidence: 0.4").unwrap().confidence, 0.4);
/// assert!(parse_adjudication("no idea").is_none());
/// ```
pub fn parse_adjudication(response: &str) -> Option<AdjudicationVerdict> {
    parse_json(response).or_else(|| parse_plain(response).map(AdjudicationVerdict::score_only))
}
