//! Tokenization shared by the lexical and similarity signals.

/// Lowercase word tokens. Apostrophes stay inside words (`don't`).
pub(crate) fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        assert_eq!(
            words("I don't agree, 'really'!"),
            vec!["i", "don't", "agree", "really"]
        );
    }
}
