//! cvx core: rate-limited, retrying AI calls and cached CV builds.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`cvx_error`]: error kinds and the retry tag
//! - [`cvx_rate_limit`]: token-bucket rate limiter, retry executor, configuration
//! - [`cvx_cache`]: content-addressed agent output cache
//! - [`cvx_models`]: Anthropic and Gemini clients behind the limiter and retries
//! - [`cvx_build`]: cache-aware build orchestration
//!
//! [`cancel_on_interrupt`] supplies the cancellation token the limiter,
//! retries and builds observe, tied to Ctrl+C and SIGTERM.
//!
//! # Example
//!
//! ```no_run
//! use cvx::{
//!     CvxConfig, Verbosity, cancel_on_interrupt, connect, generate_with_optional_system,
//!     init_logging,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! init_logging(Verbosity::Verbose)?;
//!
//! let config = CvxConfig::load()?;
//! let client = connect("claude-sonnet-4", &config)?;
//! let reply = generate_with_optional_system(
//!     client.as_ref(),
//!     &cancel_on_interrupt(),
//!     "Answer with JSON.",
//!     "Summarise this job posting.",
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod signal;
mod telemetry;

pub use signal::cancel_on_interrupt;
pub use telemetry::{Verbosity, init_json_logging, init_logging};

pub use cvx_build::*;
pub use cvx_cache::*;
pub use cvx_error::*;
pub use cvx_models::*;
pub use cvx_rate_limit::*;
