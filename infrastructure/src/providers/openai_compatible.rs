//! OpenAI-compatible chat completions gateway
//!
//! Works against any endpoint speaking the `/chat/completions` protocol
//! (OpenRouter, OpenAI, local servers such as llama.cpp or vLLM).

use crate::config::FileProviderConfig;
use async_trait::async_trait;
use conclave_application::{CompletionRequest, GatewayError, LlmGateway};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// [`LlmGateway`] over an OpenAI-compatible HTTP endpoint
pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenAiCompatibleGateway {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            referer: None,
            title: None,
        }
    }

    /// Build from the `[provider]` section, resolving the API key
    pub fn from_config(config: &FileProviderConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "No API key configured, requests are sent unauthenticated"
            );
        }
        let mut gateway = Self::new(&config.base_url, api_key);
        gateway.referer = config.referer.clone();
        gateway.title = config.title.clone();
        gateway
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = ChatRequest {
            model: &request.model,
            messages: render_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(
            model = %request.model,
            messages = body.messages.len(),
            "Sending chat completion"
        );

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), text));
        }

        let text = response.text().await.map_err(map_transport_error)?;
        extract_content(&text)
    }
}

/// Lay out a request as a chat transcript.
///
/// The requesting role's own messages become assistant turns; everyone
/// else's are user turns tagged with the author's name.
fn render_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.window.len() + 3);
    messages.push(ChatMessage::new("system", request.system_prompt.as_str()));

    if let Some(topic) = &request.topic {
        messages.push(ChatMessage::new("user", format!("Discussion topic: {}", topic)));
    }

    for message in &request.window {
        let own = matches!(
            (message.author_role(), request.speaker.as_deref()),
            (Some(author), Some(speaker)) if author == speaker
        );
        if own {
            messages.push(ChatMessage::new("assistant", message.content.as_str()));
        } else {
            let name = message.author_role().unwrap_or("User");
            messages.push(ChatMessage::new(
                "user",
                format!("[{}]: {}", name, message.content),
            ));
        }
    }

    messages.push(ChatMessage::new("user", request.instruction.as_str()));
    messages
}

fn classify_status(status: u16, body: String) -> GatewayError {
    let message = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body
    };
    match status {
        401 | 403 => GatewayError::Unauthorized(message),
        404 => GatewayError::ModelNotAvailable(message),
        408 => GatewayError::Timeout,
        429 => GatewayError::RateLimited(message),
        400 | 422 => GatewayError::InvalidRequest(message),
        500..=599 => GatewayError::ServerError { status, message },
        _ => GatewayError::Other(format!("HTTP {}: {}", status, message)),
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_decode() {
        GatewayError::MalformedResponse(error.to_string())
    } else {
        GatewayError::ConnectionError(error.to_string())
    }
}

fn extract_content(body: &str) -> Result<String, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GatewayError::EmptyResponse)
}
