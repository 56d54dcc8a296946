//! Agent names and the providers behind them.
//!
//! An agent name selects both a provider and how it is reached:
//!
//! | name                       | agent                               |
//! |----------------------------|-------------------------------------|
//! | `claude`, `claude:<sub>`   | Claude CLI, optional sub-agent      |
//! | `gemini`, `gemini:<sub>`   | Gemini CLI, optional sub-agent      |
//! | `claude-*`                 | Anthropic Messages API              |
//! | `gemini-*`                 | Gemini `generateContent` API        |

use cvx_error::{ProviderError, ProviderErrorKind, ProviderResult};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Claude agent used when none is named.
pub const CLAUDE_DEFAULT_AGENT: &str = "claude-sonnet-4";

/// Gemini agent used when none is named.
pub const GEMINI_DEFAULT_AGENT: &str = "gemini-2.5-flash";

/// Claude API agents known to work.
pub const CLAUDE_AGENTS: &[&str] = &[
    "claude-sonnet-4",
    "claude-sonnet-4-5",
    "claude-opus-4",
    "claude-opus-4-5",
    "claude-haiku-4",
    "claude-haiku-4-5",
];

/// Gemini API agents known to work.
pub const GEMINI_AGENTS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

const CLAUDE_MODEL_IDS: &[(&str, &str)] = &[
    ("claude-sonnet-4", "claude-sonnet-4-20250514"),
    ("claude-sonnet-4-5", "claude-sonnet-4-5-20250929"),
    ("claude-opus-4", "claude-opus-4-20250514"),
    ("claude-opus-4-5", "claude-opus-4-5-20251101"),
    ("claude-haiku-4", "claude-haiku-4-20250514"),
    ("claude-haiku-4-5", "claude-haiku-4-5-20251001"),
];

/// Anthropic model id for a Claude agent name.
///
/// Names outside the known set are passed through unchanged, so dated model
/// ids can be used directly.
///
/// ```
/// use cvx_models::claude_model_id;
///
/// assert_eq!(claude_model_id("claude-sonnet-4"), "claude-sonnet-4-20250514");
/// assert_eq!(claude_model_id("claude-3-5-haiku-latest"), "claude-3-5-haiku-latest");
/// ```
pub fn claude_model_id(agent: &str) -> &str {
    CLAUDE_MODEL_IDS
        .iter()
        .find(|(name, _)| *name == agent)
        .map(|(_, id)| *id)
        .unwrap_or(agent)
}

/// AI provider families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
}

impl Provider {
    /// Name used in configuration sections and error messages.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Environment variable holding the API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Claude => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// API agent used when none is named.
    pub fn default_agent(self) -> &'static str {
        match self {
            Provider::Claude => CLAUDE_DEFAULT_AGENT,
            Provider::Gemini => GEMINI_DEFAULT_AGENT,
        }
    }

    /// API agents known to work with this provider.
    pub fn supported_agents(self) -> &'static [&'static str] {
        match self {
            Provider::Claude => CLAUDE_AGENTS,
            Provider::Gemini => GEMINI_AGENTS,
        }
    }
}

/// A parsed agent name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentSpec {
    /// A provider's command-line agent, with an optional sub-agent
    /// (`claude:sonnet-4.5` names sub-agent `sonnet-4.5`).
    Cli {
        /// Provider behind the CLI
        provider: Provider,
        /// Sub-agent after the colon, if any
        sub_agent: Option<String>,
    },
    /// A provider's HTTP API, addressed by agent name.
    Api {
        /// Provider serving the API
        provider: Provider,
        /// Agent name as given (`claude-sonnet-4`, `gemini-2.5-pro`, ...)
        agent: String,
    },
}

impl AgentSpec {
    /// Parse an agent name.
    ///
    /// # Errors
    ///
    /// Returns `ProviderErrorKind::UnknownAgent` for names no provider accepts.
    ///
    /// # Example
    ///
    /// ```
    /// use cvx_models::{AgentSpec, Provider};
    ///
    /// let spec = AgentSpec::parse("claude:sonnet-4.5").unwrap();
    /// assert_eq!(spec.provider(), Provider::Claude);
    /// assert!(spec.is_cli());
    ///
    /// assert!(AgentSpec::parse("gpt-4").is_err());
    /// ```
    #[track_caller]
    pub fn parse(name: &str) -> ProviderResult<Self> {
        for provider in [Provider::Claude, Provider::Gemini] {
            let prefix = provider.name();
            if name == prefix {
                return Ok(AgentSpec::Cli {
                    provider,
                    sub_agent: None,
                });
            }
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some(sub) = rest.strip_prefix(':') {
                    return Ok(AgentSpec::Cli {
                        provider,
                        sub_agent: (!sub.is_empty()).then(|| sub.to_string()),
                    });
                }
                if rest.starts_with('-') {
                    return Ok(AgentSpec::Api {
                        provider,
                        agent: name.to_string(),
                    });
                }
            }
        }

        Err(ProviderError::new(ProviderErrorKind::UnknownAgent(
            name.to_string(),
        )))
    }

    /// Provider behind this agent.
    pub fn provider(&self) -> Provider {
        match self {
            AgentSpec::Cli { provider, .. } | AgentSpec::Api { provider, .. } => *provider,
        }
    }

    /// True for command-line agents.
    pub fn is_cli(&self) -> bool {
        matches!(self, AgentSpec::Cli { .. })
    }

    /// Model id sent on the wire, for API agents.
    pub fn api_model(&self) -> Option<&str> {
        match self {
            AgentSpec::Api {
                provider: Provider::Claude,
                agent,
            } => Some(claude_model_id(agent)),
            AgentSpec::Api { agent, .. } => Some(agent),
            AgentSpec::Cli { .. } => None,
        }
    }

    /// True if this is an API agent from the provider's known list.
    ///
    /// CLI agents depend on a binary being installed, which is not checked here.
    pub fn is_known_api_agent(&self) -> bool {
        match self {
            AgentSpec::Api { provider, agent } => {
                provider.supported_agents().contains(&agent.as_str())
            }
            AgentSpec::Cli { .. } => false,
        }
    }
}

impl std::str::FromStr for AgentSpec {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentSpec::parse(s)
    }
}

impl std::fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentSpec::Cli {
                provider,
                sub_agent: None,
            } => write!(f, "{}", provider),
            AgentSpec::Cli {
                provider,
                sub_agent: Some(sub),
            } => write!(f, "{}:{}", provider, sub),
            AgentSpec::Api { agent, .. } => write!(f, "{}", agent),
        }
    }
}

/// Every API agent known to any provider.
pub fn supported_api_agents() -> impl Iterator<Item = &'static str> {
    GEMINI_AGENTS.iter().chain(CLAUDE_AGENTS.iter()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_cli_agents() {
        assert_eq!(
            AgentSpec::parse("claude").unwrap(),
            AgentSpec::Cli {
                provider: Provider::Claude,
                sub_agent: None
            }
        );
        assert_eq!(
            AgentSpec::parse("gemini:flash").unwrap(),
            AgentSpec::Cli {
                provider: Provider::Gemini,
                sub_agent: Some("flash".to_string())
            }
        );
    }

    #[test]
    fn test_api_agents() {
        let spec = AgentSpec::parse("claude-opus-4-5").unwrap();
        assert_eq!(spec.provider(), Provider::Claude);
        assert_eq!(spec.api_model(), Some("claude-opus-4-5-20251101"));
        assert!(spec.is_known_api_agent());

        let spec = AgentSpec::parse("gemini-2.5-pro").unwrap();
        assert_eq!(spec.provider(), Provider::Gemini);
        assert_eq!(spec.api_model(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_unknown_agents_rejected() {
        for name in ["", "gpt-4", "claudex", "Gemini", "ollama:llama3"] {
            let err = AgentSpec::parse(name).unwrap_err();
            assert!(
                matches!(err.kind, ProviderErrorKind::UnknownAgent(_)),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for name in ["claude", "claude:sonnet-4.5", "gemini", "gemini-2.0-flash"] {
            assert_eq!(AgentSpec::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_defaults_are_supported() {
        for provider in Provider::iter() {
            assert!(
                provider
                    .supported_agents()
                    .contains(&provider.default_agent())
            );
        }
    }

    #[test]
    fn test_every_claude_agent_maps_to_dated_id() {
        for agent in CLAUDE_AGENTS {
            assert_ne!(claude_model_id(agent), *agent);
        }
    }
}
