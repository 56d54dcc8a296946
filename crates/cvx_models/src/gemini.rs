//! Gemini backend on the `gemini-rust` client.
//!
//! Responses are requested as `application/json`, since every cvx prompt
//! asks for structured output.

use crate::{Provider, ProviderBackend, classify};
use async_trait::async_trait;
use cvx_error::{ProviderError, ProviderErrorKind, ProviderResult};
use gemini_rust::{Gemini, client::Model};
use tracing::{debug, error, instrument};

const JSON_MIME_TYPE: &str = "application/json";

/// Map a model name onto the client's model enum.
///
/// Names without a dedicated variant become `Model::Custom` with the
/// `models/` prefix the API expects.
fn model_for(name: &str) -> Model {
    match name {
        "gemini-2.5-flash" => Model::Gemini25Flash,
        "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
        "gemini-2.5-pro" => Model::Gemini25Pro,
        other if other.starts_with("models/") => Model::Custom(other.to_string()),
        other => Model::Custom(format!("models/{}", other)),
    }
}

/// HTTP status carried in a client error message.
///
/// The client reports failed responses as
/// `bad response from server; code 503; description: ...`.
fn status_from_message(message: &str) -> Option<u16> {
    let start = message.find("code ")? + "code ".len();
    let digits: String = message[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Classify a `gemini-rust` failure.
fn classify_client_error(err: impl std::fmt::Display, model: &str) -> ProviderError {
    let message = err.to_string();
    classify(
        Provider::Gemini,
        status_from_message(&message),
        &message,
        model,
    )
}

/// Gemini API backend.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Gemini,
    model: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Creates a new Gemini backend.
    ///
    /// An empty `model` selects the default agent.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the underlying HTTP client cannot be built.
    pub fn new(api_key: impl AsRef<str>, model: &str) -> ProviderResult<Self> {
        let model = if model.is_empty() {
            Provider::Gemini.default_agent()
        } else {
            model
        };
        debug!(model, "Creating Gemini backend");

        let client = Gemini::with_model(api_key.as_ref(), model_for(model)).map_err(|e| {
            error!(error = %e, "Failed to create Gemini client");
            ProviderError::for_provider(
                Provider::Gemini.name(),
                ProviderErrorKind::Network(e.to_string()),
            )
        })?;

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    /// Creates a backend using the key in `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or empty.
    pub fn from_env(model: &str) -> ProviderResult<Self> {
        let var = Provider::Gemini.api_key_var();
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Self::new(key, model),
            _ => Err(ProviderError::for_provider(
                Provider::Gemini.name(),
                ProviderErrorKind::MissingApiKey(var.to_string()),
            )),
        }
    }
}

#[async_trait]
impl ProviderBackend for GeminiBackend {
    fn provider_name(&self) -> &'static str {
        Provider::Gemini.name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn send(&self, system_prompt: Option<&str>, user_prompt: &str) -> ProviderResult<String> {
        let mut builder = self
            .client
            .generate_content()
            .with_user_message(user_prompt)
            .with_response_mime_type(JSON_MIME_TYPE);

        if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
            builder = builder.with_system_prompt(system);
        }

        debug!("Sending request to Gemini API");
        let response = builder.execute().await.map_err(|e| {
            error!(error = %e, "Gemini API request failed");
            classify_client_error(e, &self.model)
        })?;

        let text = response.text();
        debug!(text_len = text.len(), "Received response from Gemini");
        if text.is_empty() {
            return Err(ProviderError::for_provider(
                Provider::Gemini.name(),
                ProviderErrorKind::EmptyResponse,
            ));
        }
        Ok(text)
    }
}
