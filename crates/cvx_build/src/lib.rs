//! Cached CV and cover letter builds.
//!
//! A build hands a job posting and the current CV and letter to a
//! [`TailorAgent`] and gets tailored versions back. [`CachedBuild`] keys each
//! build by its inputs and the agent's model, so repeating a build with
//! unchanged inputs reuses the stored output instead of calling the agent.
//!
//! # Example
//!
//! ```no_run
//! use cvx_build::{BuildRequest, CachedBuild, ModelTailorAgent};
//! use cvx_cache::AgentCache;
//! use cvx_models::connect;
//! use cvx_rate_limit::CvxConfig;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CvxConfig::load()?;
//! let agent = ModelTailorAgent::new(
//!     connect("claude-sonnet-4", &config)?,
//!     "Tailor the CV and letter to the job posting. Reply with JSON {\"cv\": ..., \"letter\": ...}.",
//! );
//! let build = CachedBuild::new(agent, AgentCache::relative_to_current_dir(&config.cache.dir)?);
//!
//! let request = BuildRequest::builder()
//!     .issue_number(42u64)
//!     .job_posting("Senior Rust Engineer, Berlin")
//!     .cv(json!({"name": "John"}).as_object().cloned().unwrap_or_default())
//!     .letter(json!({"sender": "John"}).as_object().cloned().unwrap_or_default())
//!     .build()?;
//!
//! let outcome = build.run(&CancellationToken::new(), &request, false).await?;
//! println!("cached: {}", outcome.cached());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod build;
mod json;

pub use agent::{AgentInput, ModelTailorAgent, TailorAgent};
pub use build::{BuildOutcome, BuildRequest, BuildRequestBuilder, CachedBuild};
pub use json::{canonical_json, extract_json, parse_agent_output};
