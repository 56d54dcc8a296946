//! Content-addressed cache for agent build output.
//!
//! A build sends the job posting, the current CV and letter, the schema, and
//! the model name to a tailoring agent. When none of those inputs changed
//! since the last build, the agent's previous answer is reused from disk.
//!
//! # Features
//!
//! - **Deterministic keys**: [`cache_key`] hashes the build inputs with SHA-256
//! - **No invalidation**: changing any input yields a new key; stale entries
//!   are simply never looked up again
//! - **Project scoped**: entries live under `.cvx/cache/agent/` in the
//!   working directory
//! - **Atomic writes**: temp file + rename, last writer wins
//!
//! # Example
//!
//! ```no_run
//! use cvx_cache::{AgentCache, cache_key};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = AgentCache::in_current_dir()?;
//! let key = cache_key(42, "Job posting", r#"{"name":"Ada"}"#, "{}", "{}", "gemini-2.5-flash");
//!
//! if !cache.exists(&key).await {
//!     let cv = json!({"name": "Ada"});
//!     let letter = json!({"sender": "Ada"});
//!     cache.write(&key, cv.as_object().unwrap(), letter.as_object().unwrap()).await?;
//! }
//! let output = cache.read(&key).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod key;

pub use cache::{AgentCache, AgentOutput, DEFAULT_CACHE_DIR, JsonObject, exists, read, write};
pub use key::{KEY_LEN, cache_key};
