//! Tailoring agents: job posting plus current documents in, tailored
//! documents out.

use crate::parse_agent_output;
use async_trait::async_trait;
use cvx_cache::{AgentOutput, JsonObject};
use cvx_error::{CvxResult, JsonError};
use cvx_models::{ContentGenerator, generate_with_optional_system};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// What a tailoring agent receives.
///
/// Serialises as `{"job_posting": "...", "cv": {...}, "letter": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AgentInput {
    job_posting: String,
    cv: JsonObject,
    letter: JsonObject,
}

impl AgentInput {
    /// Bundle a posting with the documents to tailor.
    pub fn new(job_posting: impl Into<String>, cv: JsonObject, letter: JsonObject) -> Self {
        Self {
            job_posting: job_posting.into(),
            cv,
            letter,
        }
    }
}

/// Produces a tailored CV and letter for a job posting.
#[async_trait]
pub trait TailorAgent: Send + Sync {
    /// Model that does the tailoring. Part of the cache key.
    fn model_name(&self) -> &str;

    /// Tailor the documents in `input`.
    ///
    /// Both returned objects must be present; a reply missing either is an
    /// error.
    async fn tailor(&self, cancel: &CancellationToken, input: &AgentInput)
    -> CvxResult<AgentOutput>;
}

/// A [`TailorAgent`] backed by an AI client.
///
/// The input is sent as JSON in the user prompt, and the reply is parsed
/// with [`parse_agent_output`], so fenced or chatty replies are accepted.
pub struct ModelTailorAgent {
    client: Box<dyn ContentGenerator>,
    system_prompt: String,
}

impl std::fmt::Debug for ModelTailorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelTailorAgent")
            .field("provider", &self.client.provider_name())
            .field("model", &self.client.model_name())
            .finish_non_exhaustive()
    }
}

impl ModelTailorAgent {
    /// Tailor with `client`, instructing it with `system_prompt`.
    pub fn new(client: Box<dyn ContentGenerator>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }
}

#[async_trait]
impl TailorAgent for ModelTailorAgent {
    fn model_name(&self) -> &str {
        self.client.model_name()
    }

    #[instrument(skip_all, fields(model = self.client.model_name()))]
    async fn tailor(
        &self,
        cancel: &CancellationToken,
        input: &AgentInput,
    ) -> CvxResult<AgentOutput> {
        let user_prompt = serde_json::to_string_pretty(input)
            .map_err(|e| JsonError::new(format!("failed to marshal input: {}", e)))?;

        let reply = generate_with_optional_system(
            self.client.as_ref(),
            cancel,
            &self.system_prompt,
            &user_prompt,
        )
        .await?;
        debug!(reply_len = reply.len(), "Agent replied");

        Ok(parse_agent_output(&reply)?)
    }
}
