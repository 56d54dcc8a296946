//! Test utilities for cvx_models tests.
//!
//! [`MockBackend`] plays back a scripted sequence of results and records
//! every request it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use cvx_error::{ProviderError, ProviderErrorKind, ProviderResult};
use cvx_models::ProviderBackend;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A request as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
}

/// Scripted provider backend.
#[derive(Debug)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<String, ProviderErrorKind>>>,
    fallback: String,
    supports_system: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenRequest>>,
}

impl MockBackend {
    /// Always answers `text`.
    pub fn new_success(text: &str) -> Self {
        Self::scripted(Vec::new(), text)
    }

    /// Plays `script` in order, then answers `fallback`.
    pub fn scripted(script: Vec<Result<String, ProviderErrorKind>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: fallback.to_string(),
            supports_system: true,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `kind`.
    pub fn always_failing(kind: ProviderErrorKind, times: usize) -> Self {
        Self::scripted(vec![Err(kind); times], "unreachable")
    }

    /// Reports no system prompt support.
    pub fn without_system_prompt(mut self) -> Self {
        self.supports_system = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderBackend for MockBackend {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn supports_system_prompt(&self) -> bool {
        self.supports_system
    }

    async fn send(&self, system_prompt: Option<&str>, user_prompt: &str) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenRequest {
            system_prompt: system_prompt.map(str::to_string),
            user_prompt: user_prompt.to_string(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(kind)) => Err(ProviderError::for_provider("mock", kind)),
            None => Ok(self.fallback.clone()),
        }
    }
}
