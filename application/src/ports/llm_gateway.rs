//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers. Generation,
//! speaker selection hints and consensus adjudication all go through the
//! same [`LlmGateway::complete`] contract.

use async_trait::async_trait;
use conclave_domain::Message;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether the call may succeed if repeated.
    ///
    /// Timeouts, rate limits, connection and 5xx failures are transient;
    /// authentication and validation failures are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionError(_)
                | GatewayError::Timeout
                | GatewayError::RateLimited(_)
                | GatewayError::ServerError { .. }
                | GatewayError::EmptyResponse
                | GatewayError::MalformedResponse(_)
        )
    }
}

/// A single completion request.
///
/// `window` holds prior transcript messages, oldest first. When `speaker`
/// is set, adapters render that role's own messages as assistant turns.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub topic: Option<String>,
    pub window: Vec<Message>,
    pub speaker: Option<String>,
    /// Final user-side instruction
    pub instruction: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            topic: None,
            window: Vec::new(),
            speaker: None,
            instruction: instruction.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_window(mut self, window: Vec<Message>, speaker: Option<String>) -> Self {
        self.window = window;
        self.speaker = speaker;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Run one completion and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::RateLimited("slow down".into()).is_transient());
        assert!(
            GatewayError::ServerError {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(!GatewayError::Unauthorized("bad key".into()).is_transient());
        assert!(!GatewayError::InvalidRequest("bad body".into()).is_transient());
        assert!(!GatewayError::ModelNotAvailable("x".into()).is_transient());
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("m", "sys", "go")
            .with_topic("T")
            .with_temperature(0.2)
            .with_max_tokens(Some(100));
        assert_eq!(request.topic.as_deref(), Some("T"));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, Some(100));
        assert!(request.window.is_empty());
    }
}
