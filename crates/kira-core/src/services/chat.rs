//! Chat-completion model reached through an OpenAI-compatible endpoint.
//!
//! The request/response structures only carry the fields kira sends or reads;
//! anything else in the upstream payload is ignored.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, endpoint, ServiceError};

const SERVICE: &str = "chat model";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// A single message in the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author (`"system"`, `"user"`, `"assistant"`).
    pub role: String,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Prompt-in, text-out chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the first choice's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError>;
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Response body for `POST /chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`ChatModel`] speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Default for OpenAiChat {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiChat {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bearer token; empty keys are treated as absent.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self
            .client
            .post(endpoint(&self.base_url, "/chat/completions"))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(SERVICE, request.send().await?).await?;
        let parsed: ChatCompletionResponse = response.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: SERVICE,
                message: "completion has no message content".into(),
            })?;

        debug!(model = %self.model, output_len = content.len(), "chat completion done");
        Ok(content)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn empty_api_key_is_dropped() {
        let chat = OpenAiChat::new().with_api_key("");
        assert!(chat.api_key.is_none());
        let chat = OpenAiChat::new().with_api_key("sk-test");
        assert_eq!(chat.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn defaults_match_reply_contract() {
        let chat = OpenAiChat::new();
        assert_eq!(chat.model(), "gpt-4o-mini");
        assert_eq!(chat.max_tokens, 300);
        assert!((chat.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 300,
                "messages": [
                    { "role": "system", "content": "be nice" },
                    { "role": "user", "content": "hello" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": "{\"mood\":\"calm\"}" }, "finish_reason": "stop" }
                ],
                "usage": { "prompt_tokens": 3, "completion_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let chat = OpenAiChat::new()
            .with_base_url(server.uri())
            .with_api_key("sk-test");
        let out = chat
            .complete(&[ChatMessage::system("be nice"), ChatMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(out, "{\"mood\":\"calm\"}");
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = OpenAiChat::new()
            .with_base_url(server.uri())
            .complete(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    }
}
