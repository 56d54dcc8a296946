//! Capability traits for AI clients.
//!
//! Every client can generate content from a single prompt. Clients whose
//! provider supports a separate, cacheable system prompt also implement
//! [`SystemPromptGenerator`] and advertise it through
//! [`ContentGenerator::system_prompt_support`].

use async_trait::async_trait;
use cvx_error::ProviderResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Base capability: prompt in, text out.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Provider name ("claude", "gemini", ...).
    fn provider_name(&self) -> &'static str;

    /// Model id sent to the provider.
    fn model_name(&self) -> &str;

    /// Generate a response to `prompt`.
    ///
    /// Fails with a cancellation error if `cancel` fires first.
    async fn generate_content(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> ProviderResult<String>;

    /// The system-prompt capability, if this client has it.
    fn system_prompt_support(&self) -> Option<&dyn SystemPromptGenerator> {
        None
    }
}

/// Extended capability: a system prompt sent apart from the user prompt,
/// which the provider may cache between calls.
#[async_trait]
pub trait SystemPromptGenerator: ContentGenerator {
    /// Generate a response to `user_prompt` under `system_prompt`.
    ///
    /// An empty system prompt behaves like
    /// [`ContentGenerator::generate_content`].
    async fn generate_content_with_system(
        &self,
        cancel: &CancellationToken,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ProviderResult<String>;
}

/// Send a system and a user prompt through whatever the client supports.
///
/// Uses the system-prompt capability when present. Otherwise the two prompts
/// are joined with a blank line and sent as one.
#[instrument(skip_all, fields(provider = client.provider_name(), model = client.model_name()))]
pub async fn generate_with_optional_system(
    client: &dyn ContentGenerator,
    cancel: &CancellationToken,
    system_prompt: &str,
    user_prompt: &str,
) -> ProviderResult<String> {
    if system_prompt.is_empty() {
        return client.generate_content(cancel, user_prompt).await;
    }

    match client.system_prompt_support() {
        Some(extended) => {
            extended
                .generate_content_with_system(cancel, system_prompt, user_prompt)
                .await
        }
        None => {
            debug!("Client has no system prompt support, sending combined prompt");
            let combined = format!("{}\n\n{}", system_prompt, user_prompt);
            client.generate_content(cancel, &combined).await
        }
    }
}
