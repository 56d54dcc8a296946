//! Configuration loading for cvx.
//!
//! Settings are read from TOML with the following precedence (later sources
//! override earlier ones):
//! - Bundled defaults (include_str! from cvx.toml)
//! - User config in the home directory (~/.config/cvx/cvx.toml)
//! - Project config in the current directory (./cvx.toml)
//! - `CVX__SECTION__KEY` environment variables
//!
//! The loaded [`CvxConfig`] is passed explicitly to whatever needs it; there
//! is no process-wide configuration state.

use crate::{RateLimiter, RetryConfig};
use config::{Config, Environment, File, FileFormat};
use cvx_error::{ConfigError, CvxError, CvxResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Requests per second used when a provider has no configured rate.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;

/// Retry policy as written in configuration files.
///
/// ```toml
/// [retry]
/// max_retries = 3
/// base_delay_ms = 1000
/// max_delay_ms = 30000
/// multiplier = 2.0
/// jitter_ratio = 0.1
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Exponential growth factor
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Fraction of each delay randomised in either direction
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter_ratio() -> f64 {
    0.1
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

impl TryFrom<&RetrySettings> for RetryConfig {
    type Error = ConfigError;

    fn try_from(settings: &RetrySettings) -> Result<Self, Self::Error> {
        RetryConfig::new(
            settings.max_retries,
            Duration::from_millis(settings.base_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
            settings.multiplier,
            settings.jitter_ratio,
        )
    }
}

/// Per-provider settings.
///
/// ```toml
/// [providers.gemini]
/// requests_per_second = 1.0
/// default_model = "gemini-2.5-flash"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Steady-state request rate, also the burst size
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Model used when the caller names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

fn default_requests_per_second() -> f64 {
    DEFAULT_REQUESTS_PER_SECOND
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            default_model: None,
        }
    }
}

/// Agent build cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Cache directory, relative to the working directory unless absolute
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cvx/cache/agent")
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// Agent selection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentSettings {
    /// Agent used when none is given on the command line
    #[serde(default = "default_agent")]
    pub default: String,
}

fn default_agent() -> String {
    "claude".to_string()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            default: default_agent(),
        }
    }
}

/// Top-level cvx configuration.
///
/// # Example
///
/// ```no_run
/// use cvx_rate_limit::CvxConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CvxConfig::load()?;
/// let limiter = config.limiter_for("gemini")?;
/// println!("Gemini rate: {} req/s", limiter.rate());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct CvxConfig {
    /// Agent selection
    #[serde(default)]
    pub agent: AgentSettings,
    /// Retry policy for AI calls
    #[serde(default)]
    pub retry: RetrySettings,
    /// Agent build cache
    #[serde(default)]
    pub cache: CacheSettings,
    /// Map of provider name to provider settings
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl CvxConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> CvxResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                CvxError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                CvxError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    /// Environment variables are named `CVX__SECTION__KEY`, e.g.
    /// `CVX__PROVIDERS__GEMINI__REQUESTS_PER_SECOND=2`.
    #[instrument]
    pub fn load() -> CvxResult<Self> {
        Self::load_with_env(Self::environment())
    }

    /// The `CVX__`-prefixed environment layer used by [`load`](Self::load).
    ///
    /// Call `.source(Some(map))` on it to read variables from a map instead
    /// of the process environment.
    pub fn environment() -> Environment {
        Environment::with_prefix("CVX")
            .separator("__")
            .try_parsing(true)
    }

    /// [`load`](Self::load) with `env` as the top layer.
    #[instrument(skip(env))]
    pub fn load_with_env(env: Environment) -> CvxResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../cvx.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/cvx/cvx.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("cvx").required(false))
            .add_source(env);

        builder
            .build()
            .map_err(|e| {
                CvxError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                CvxError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Validated retry policy.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the `[retry]` section is out of range.
    pub fn retry_config(&self) -> Result<RetryConfig, ConfigError> {
        RetryConfig::try_from(&self.retry)
    }

    /// Settings for a provider, falling back to defaults when unconfigured.
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    /// A fresh rate limiter for a provider's configured rate.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configured rate is not positive.
    #[instrument(skip(self))]
    pub fn limiter_for(&self, name: &str) -> Result<RateLimiter, ConfigError> {
        let settings = self.provider(name);
        debug!(
            provider = name,
            requests_per_second = settings.requests_per_second,
            "Creating provider rate limiter"
        );
        RateLimiter::new(settings.requests_per_second)
    }
}
