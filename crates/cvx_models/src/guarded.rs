//! Rate-limited, retrying client over a raw provider backend.

use crate::{ContentGenerator, SystemPromptGenerator};
use async_trait::async_trait;
use cvx_error::{CvxResult, ProviderResult};
use cvx_rate_limit::{CvxConfig, RateLimiter, RetryConfig};
use derive_getters::Getters;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// One raw round trip to a provider, with no rate limiting or retries.
///
/// Implementations classify their failures so that transient ones report
/// `is_retryable() == true`.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Provider name ("claude", "gemini", ...).
    fn provider_name(&self) -> &'static str;

    /// Model id sent to the provider.
    fn model_name(&self) -> &str;

    /// Whether the provider takes a separate system prompt.
    fn supports_system_prompt(&self) -> bool {
        true
    }

    /// Send one request.
    async fn send(&self, system_prompt: Option<&str>, user_prompt: &str) -> ProviderResult<String>;
}

/// A provider backend behind its own rate limiter and retry policy.
///
/// Each call waits for one rate-limit token and then runs the request
/// through the retry executor. Retries do not take further tokens.
///
/// # Example
///
/// ```no_run
/// use cvx_models::{AnthropicBackend, ContentGenerator, GuardedClient};
/// use cvx_rate_limit::CvxConfig;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CvxConfig::load()?;
/// let backend = AnthropicBackend::from_env("claude-sonnet-4")?;
/// let client = GuardedClient::from_config(backend, &config)?;
///
/// let text = client
///     .generate_content(&CancellationToken::new(), "Say hello")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Getters)]
pub struct GuardedClient<B> {
    backend: B,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl<B: ProviderBackend> GuardedClient<B> {
    /// Wrap `backend` with an explicit limiter and retry policy.
    pub fn new(backend: B, limiter: RateLimiter, retry: RetryConfig) -> Self {
        debug!(
            provider = backend.provider_name(),
            model = backend.model_name(),
            rate = limiter.rate(),
            "Creating guarded client"
        );
        Self {
            backend,
            limiter,
            retry,
        }
    }

    /// Wrap `backend` with the rate and retry policy configured for its provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider rate or the retry
    /// section is invalid.
    pub fn from_config(backend: B, config: &CvxConfig) -> CvxResult<Self> {
        let limiter = config.limiter_for(backend.provider_name())?;
        let retry = config.retry_config()?;
        Ok(Self::new(backend, limiter, retry))
    }

    #[instrument(
        skip_all,
        fields(
            provider = self.backend.provider_name(),
            model = self.backend.model_name(),
            with_system = system_prompt.is_some()
        )
    )]
    async fn call(
        &self,
        cancel: &CancellationToken,
        system_prompt: Option<&str>,
        user_prompt: &str,
    ) -> ProviderResult<String> {
        let backend = &self.backend;
        self.limiter
            .execute(cancel, &self.retry, move || {
                backend.send(system_prompt, user_prompt)
            })
            .await
    }
}

#[async_trait]
impl<B: ProviderBackend> ContentGenerator for GuardedClient<B> {
    fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    async fn generate_content(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> ProviderResult<String> {
        self.call(cancel, None, prompt).await
    }

    fn system_prompt_support(&self) -> Option<&dyn SystemPromptGenerator> {
        if self.backend.supports_system_prompt() {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl<B: ProviderBackend> SystemPromptGenerator for GuardedClient<B> {
    async fn generate_content_with_system(
        &self,
        cancel: &CancellationToken,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ProviderResult<String> {
        let system_prompt = (!system_prompt.is_empty()).then_some(system_prompt);
        self.call(cancel, system_prompt, user_prompt).await
    }
}
