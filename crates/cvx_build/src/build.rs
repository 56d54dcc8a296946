//! Cache-aware build: consult the agent cache before calling the agent.

use crate::{AgentInput, TailorAgent, canonical_json};
use cvx_cache::{AgentCache, AgentOutput, JsonObject, cache_key};
use cvx_error::{CvxError, CvxErrorKind, CvxResult};
use derive_builder::Builder;
use derive_getters::Getters;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Inputs to one build.
///
/// # Example
///
/// ```
/// use cvx_build::BuildRequest;
/// use serde_json::json;
///
/// let request = BuildRequest::builder()
///     .issue_number(42u64)
///     .job_posting("Senior Rust Engineer")
///     .cv(json!({"name": "John"}).as_object().cloned().unwrap())
///     .letter(json!({"sender": "John"}).as_object().cloned().unwrap())
///     .schema("{}")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.cache_key("gemini-2.5-flash").len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Getters)]
#[builder(setter(into))]
pub struct BuildRequest {
    /// Issue the job posting was filed under
    issue_number: u64,
    /// Job posting text
    job_posting: String,
    /// Current CV
    cv: JsonObject,
    /// Current letter
    letter: JsonObject,
    /// Schema text the documents follow
    #[builder(default)]
    schema: String,
}

impl BuildRequest {
    /// Builder for a build request.
    pub fn builder() -> BuildRequestBuilder {
        BuildRequestBuilder::default()
    }

    /// Cache key for this request built with `model`.
    pub fn cache_key(&self, model: &str) -> String {
        cache_key(
            self.issue_number,
            &self.job_posting,
            &canonical_json(&self.cv),
            &canonical_json(&self.letter),
            &self.schema,
            model,
        )
    }

    fn agent_input(&self) -> AgentInput {
        AgentInput::new(self.job_posting.clone(), self.cv.clone(), self.letter.clone())
    }
}

fn is_not_found(err: &CvxError) -> bool {
    matches!(err.kind(), CvxErrorKind::Storage(e) if e.is_not_found())
}

/// Result of a build.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct BuildOutcome {
    /// Tailored documents
    output: AgentOutput,
    /// Cache key the output is stored under
    key: String,
    /// True when the output came from the cache without calling the agent
    cached: bool,
}

impl BuildOutcome {
    /// Take the tailored documents.
    pub fn into_output(self) -> AgentOutput {
        self.output
    }
}

/// Runs a [`TailorAgent`] behind the agent output cache.
#[derive(Debug, Getters)]
pub struct CachedBuild<A> {
    agent: A,
    cache: AgentCache,
}

impl<A: TailorAgent> CachedBuild<A> {
    /// Build with `agent`, caching output in `cache`.
    pub fn new(agent: A, cache: AgentCache) -> Self {
        Self { agent, cache }
    }

    /// Produce tailored documents for `request`.
    ///
    /// A cached entry for the same inputs and model is returned without
    /// calling the agent, unless `refresh` is set. Otherwise the agent runs
    /// and its output replaces the entry.
    ///
    /// # Errors
    ///
    /// Agent failures and cache write failures are returned. An unreadable
    /// or corrupt cache entry is treated as a miss.
    #[instrument(skip(self, cancel, request), fields(issue = request.issue_number, model = self.agent.model_name()))]
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        request: &BuildRequest,
        refresh: bool,
    ) -> CvxResult<BuildOutcome> {
        let key = request.cache_key(self.agent.model_name());

        if refresh {
            debug!(%key, "Refresh requested, skipping cache");
        } else {
            match self.cache.read(&key).await {
                Ok(output) => {
                    info!(%key, "Using cached agent output");
                    return Ok(BuildOutcome {
                        output,
                        key,
                        cached: true,
                    });
                }
                Err(e) if is_not_found(&e) => debug!(%key, "Cache miss"),
                Err(e) => warn!(%key, error = %e, "Unreadable cache entry, rebuilding"),
            }
        }

        let output = self.agent.tailor(cancel, &request.agent_input()).await?;

        self.cache
            .write(&key, output.cv(), output.letter())
            .await?;

        Ok(BuildOutcome {
            output,
            key,
            cached: false,
        })
    }
}
