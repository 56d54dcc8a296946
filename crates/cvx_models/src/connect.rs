//! Building a guarded API client from an agent name.

use crate::{AgentSpec, AnthropicBackend, ContentGenerator, GeminiBackend, GuardedClient, Provider};
use cvx_error::{CvxResult, ProviderError, ProviderErrorKind};
use cvx_rate_limit::CvxConfig;
use tracing::{info, instrument};

/// Create a rate-limited, retrying client for an API agent.
///
/// The API key comes from the provider's environment variable; rate and
/// retry policy come from `config`.
///
/// # Errors
///
/// - `UnknownAgent` for names no provider accepts
/// - `Unsupported` for command-line agents, which run as subprocesses
/// - `MissingApiKey` when the provider's key is not set
/// - a configuration error for invalid rate or retry settings
#[instrument(skip(config))]
pub fn connect(agent: &str, config: &CvxConfig) -> CvxResult<Box<dyn ContentGenerator>> {
    let spec = AgentSpec::parse(agent)?;
    let Some(model) = spec.api_model() else {
        return Err(ProviderError::for_provider(
            spec.provider().name(),
            ProviderErrorKind::Unsupported(format!(
                "{} runs through its command-line tool, not the API",
                spec
            )),
        )
        .into());
    };

    info!(provider = %spec.provider(), model, "Connecting to API agent");
    let client: Box<dyn ContentGenerator> = match spec.provider() {
        Provider::Claude => Box::new(GuardedClient::from_config(
            AnthropicBackend::from_env(model)?,
            config,
        )?),
        Provider::Gemini => Box::new(GuardedClient::from_config(
            GeminiBackend::from_env(model)?,
            config,
        )?),
    };
    Ok(client)
}
