//! AI provider integrations for cvx.
//!
//! Provider clients are layered:
//!
//! - a [`ProviderBackend`] makes one provider round trip and classifies
//!   failures as transient or permanent ([`AnthropicBackend`],
//!   [`GeminiBackend`]);
//! - a [`GuardedClient`] puts a backend behind its own
//!   [`RateLimiter`](cvx_rate_limit::RateLimiter) and retry policy;
//! - callers see the [`ContentGenerator`] capability and, where supported,
//!   [`SystemPromptGenerator`] for cacheable system prompts.
//!
//! # Example
//!
//! ```no_run
//! use cvx_models::{connect, generate_with_optional_system};
//! use cvx_rate_limit::CvxConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CvxConfig::load()?;
//! let client = connect("gemini-2.5-flash", &config)?;
//!
//! let json = generate_with_optional_system(
//!     client.as_ref(),
//!     &CancellationToken::new(),
//!     "Extract the job posting as JSON.",
//!     "Senior Rust Engineer, Berlin ...",
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod anthropic;
mod classify;
mod connect;
mod gemini;
mod guarded;
mod traits;

pub use agent::{
    AgentSpec, CLAUDE_AGENTS, CLAUDE_DEFAULT_AGENT, GEMINI_AGENTS, GEMINI_DEFAULT_AGENT, Provider,
    claude_model_id, supported_api_agents,
};
pub use anthropic::{
    AnthropicBackend, AnthropicContentBlock, AnthropicMessage, AnthropicRequest,
    AnthropicRequestBuilder, AnthropicResponse, AnthropicResponseBlock, AnthropicSystemBlock,
    CacheControl,
};
pub use classify::{classify, classify_transport};
pub use connect::connect;
pub use gemini::GeminiBackend;
pub use guarded::{GuardedClient, ProviderBackend};
pub use traits::{ContentGenerator, SystemPromptGenerator, generate_with_optional_system};
