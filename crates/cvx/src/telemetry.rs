//! Logging initialisation.
//!
//! cvx is quiet by default: only warnings and errors reach stderr unless the
//! caller asks for more, or `RUST_LOG` is set.

use cvx_error::ConfigError;
use strum::{Display, EnumString};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How much to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and errors
    #[default]
    Normal,
    /// Everything down to debug, including retry attempts and cache hits
    Verbose,
}

impl Verbosity {
    /// `EnvFilter` directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
        }
    }

    /// Filter for this level, unless `RUST_LOG` overrides it.
    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// Install a human-readable stderr logger.
///
/// # Errors
///
/// Returns a `ConfigError` if a global subscriber is already installed.
pub fn init_logging(verbosity: Verbosity) -> Result<(), ConfigError> {
    tracing_subscriber::registry()
        .with(verbosity.env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize logging: {}", e)))?;

    debug!(%verbosity, "Logging initialized");
    Ok(())
}

/// Install a JSON-lines stderr logger, for machine consumption.
///
/// # Errors
///
/// Returns a `ConfigError` if a global subscriber is already installed.
pub fn init_json_logging(verbosity: Verbosity) -> Result<(), ConfigError> {
    tracing_subscriber::registry()
        .with(verbosity.env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize logging: {}", e)))?;

    debug!(%verbosity, "JSON logging initialized");
    Ok(())
}
