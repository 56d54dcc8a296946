//! Anthropic Messages API backend.

use crate::{Provider, ProviderBackend, claude_model_id, classify, classify_transport};
use async_trait::async_trait;
use cvx_error::{ProviderError, ProviderErrorKind, ProviderResult};
use derive_builder::Builder;
use derive_getters::Getters;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Message in an Anthropic request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

impl AnthropicMessage {
    /// A user turn holding one text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![AnthropicContentBlock::Text { text: text.into() }],
        }
    }
}

/// Content block in a request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnthropicContentBlock {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
}

/// Prompt caching marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    kind: String,
}

impl CacheControl {
    /// Cache for the provider's short default lifetime.
    pub fn ephemeral() -> Self {
        Self {
            kind: "ephemeral".to_string(),
        }
    }
}

/// System prompt block, marked for prompt caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AnthropicSystemBlock {
    #[serde(rename = "type")]
    kind: String,
    text: String,
    cache_control: CacheControl,
}

impl AnthropicSystemBlock {
    /// A cached text block.
    pub fn cached(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
            cache_control: CacheControl::ephemeral(),
        }
    }
}

/// Request body for `POST /v1/messages`.
///
/// # Example
///
/// ```
/// use cvx_models::{AnthropicMessage, AnthropicRequest, AnthropicSystemBlock};
///
/// let request = AnthropicRequest::builder()
///     .model("claude-sonnet-4-20250514")
///     .max_tokens(4096u32)
///     .messages(vec![AnthropicMessage::user("Tailor this CV.")])
///     .system(vec![AnthropicSystemBlock::cached("Reply with JSON only.")])
///     .build()
///     .unwrap();
///
/// assert_eq!(request.system().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Builder, Getters)]
#[builder(setter(into))]
pub struct AnthropicRequest {
    /// Anthropic model id
    model: String,
    /// Upper bound on reply tokens
    max_tokens: u32,
    /// Conversation turns, oldest first
    messages: Vec<AnthropicMessage>,
    /// Cached system prompt blocks; omitted from the body when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    system: Vec<AnthropicSystemBlock>,
}

impl AnthropicRequest {
    /// Builder for an Anthropic request.
    pub fn builder() -> AnthropicRequestBuilder {
        AnthropicRequestBuilder::default()
    }
}

/// Content block in a response.
#[derive(Debug, Clone, PartialEq, Deserialize, Getters)]
pub struct AnthropicResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Response body from `POST /v1/messages`.
#[derive(Debug, Clone, PartialEq, Deserialize, Getters)]
pub struct AnthropicResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: Vec<AnthropicResponseBlock>,
}

impl AnthropicResponse {
    /// Text of the first text block.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
    }
}

/// Anthropic API backend.
#[derive(Clone)]
pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AnthropicBackend {
    /// Creates a new Anthropic backend.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `agent` - Agent name (`claude-sonnet-4`) or model id; empty selects
    ///   the default agent
    pub fn new(api_key: impl Into<String>, agent: &str) -> Self {
        let agent = if agent.is_empty() {
            Provider::Claude.default_agent()
        } else {
            agent
        };
        let model = claude_model_id(agent).to_string();
        debug!(%model, "Creating Anthropic backend");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model,
            endpoint: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Creates a backend using the key in `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or empty.
    pub fn from_env(agent: &str) -> ProviderResult<Self> {
        let var = Provider::Claude.api_key_var();
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Ok(Self::new(key, agent)),
            _ => Err(ProviderError::for_provider(
                Provider::Claude.name(),
                ProviderErrorKind::MissingApiKey(var.to_string()),
            )),
        }
    }

    /// Send requests to `endpoint` instead of the public API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Build the request body for one call.
    pub fn request_for(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> ProviderResult<AnthropicRequest> {
        let system = system_prompt
            .filter(|s| !s.is_empty())
            .map(|s| vec![AnthropicSystemBlock::cached(s)])
            .unwrap_or_default();

        AnthropicRequest::builder()
            .model(self.model.clone())
            .max_tokens(MAX_TOKENS)
            .messages(vec![AnthropicMessage::user(user_prompt)])
            .system(system)
            .build()
            .map_err(|e| {
                ProviderError::for_provider(
                    Provider::Claude.name(),
                    ProviderErrorKind::BadRequest(e.to_string()),
                )
            })
    }
}

#[async_trait]
impl ProviderBackend for AnthropicBackend {
    fn provider_name(&self) -> &'static str {
        Provider::Claude.name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn send(&self, system_prompt: Option<&str>, user_prompt: &str) -> ProviderResult<String> {
        let request = self.request_for(system_prompt, user_prompt)?;
        debug!("Sending request to Anthropic API");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send request to Anthropic API");
                classify_transport(Provider::Claude, &e, &self.model)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Anthropic API returned error");
            return Err(classify(
                Provider::Claude,
                Some(status.as_u16()),
                &body,
                &self.model,
            ));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse Anthropic response");
            ProviderError::for_provider(
                Provider::Claude.name(),
                ProviderErrorKind::Parse(e.to_string()),
            )
        })?;

        debug!(response_id = %anthropic_response.id(), "Received response from Anthropic");
        anthropic_response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::for_provider(
                    Provider::Claude.name(),
                    ProviderErrorKind::EmptyResponse,
                )
            })
    }
}
