//! Provider configuration from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint.
///
/// ```toml
/// [provider]
/// base_url = "https://openrouter.ai/api/v1"
/// api_key_env = "OPENROUTER_API_KEY"
/// default_model = "openai/gpt-4o-mini"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Model for roles, selection and adjudication when none is set
    pub default_model: String,
    /// Sent as `HTTP-Referer` (OpenRouter attribution)
    pub referer: Option<String>,
    /// Sent as `X-Title` (OpenRouter attribution)
    pub title: Option<String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            default_model: "openai/gpt-4o-mini".to_string(),
            referer: None,
            title: Some("conclave".to_string()),
        }
    }
}

impl FileProviderConfig {
    /// Direct key first, then the configured environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_key_wins() {
        let config = FileProviderConfig {
            api_key: Some("sk-direct".to_string()),
            api_key_env: "CONCLAVE_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-direct"));
    }

    #[test]
    fn test_missing_key() {
        let config = FileProviderConfig {
            api_key_env: "CONCLAVE_TEST_UNSET_KEY_VAR".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
