//! Mapping provider failures onto [`ProviderErrorKind`].
//!
//! The HTTP status decides when there is one. Bodies and transport messages
//! are then searched for the markers each provider uses for transient
//! conditions (`rate_limit_error`, `overloaded_error`, `RESOURCE_EXHAUSTED`,
//! `UNAVAILABLE`, ...).

use crate::Provider;
use cvx_error::{ProviderError, ProviderErrorKind};
use tracing::debug;

/// Classify a failed provider response.
///
/// `status` is the HTTP status when the failure came from a response, and
/// `None` for failures that only carry a message.
///
/// # Example
///
/// ```
/// use cvx_error::RetryableError;
/// use cvx_models::{classify, Provider};
///
/// let err = classify(Provider::Claude, Some(529), "overloaded_error", "claude-sonnet-4-20250514");
/// assert!(err.is_retryable());
///
/// let err = classify(Provider::Claude, Some(401), "authentication_error", "claude-sonnet-4-20250514");
/// assert!(!err.is_retryable());
/// ```
#[track_caller]
pub fn classify(
    provider: Provider,
    status: Option<u16>,
    message: &str,
    model: &str,
) -> ProviderError {
    let kind = status
        .and_then(|status| classify_status(provider, status, message, model))
        .or_else(|| classify_message(provider, message, model))
        .unwrap_or_else(|| ProviderErrorKind::Api {
            status: status.unwrap_or_default(),
            message: message.to_string(),
        });

    debug!(
        provider = provider.name(),
        ?status,
        retryable = kind.is_retryable(),
        "Classified provider error"
    );
    ProviderError::for_provider(provider.name(), kind)
}

fn classify_status(
    provider: Provider,
    status: u16,
    message: &str,
    model: &str,
) -> Option<ProviderErrorKind> {
    let kind = match status {
        400 => ProviderErrorKind::BadRequest(message.to_string()),
        401 => ProviderErrorKind::Authentication(format!(
            "Check {} environment variable",
            provider.api_key_var()
        )),
        403 => ProviderErrorKind::PermissionDenied(model.to_string()),
        404 => ProviderErrorKind::ModelNotFound(model.to_string()),
        408 => ProviderErrorKind::Timeout(message.to_string()),
        429 => ProviderErrorKind::RateLimited(model.to_string()),
        529 => ProviderErrorKind::Overloaded(message.to_string()),
        500 | 502 | 503 | 504 => {
            ProviderErrorKind::ServiceUnavailable(format!("HTTP {}: {}", status, message))
        }
        _ => return None,
    };
    Some(kind)
}

fn classify_message(provider: Provider, message: &str, model: &str) -> Option<ProviderErrorKind> {
    let has = |needle: &str| message.contains(needle);

    let kind = if has("authentication_error") || has("UNAUTHENTICATED") {
        ProviderErrorKind::Authentication(format!(
            "Check {} environment variable",
            provider.api_key_var()
        ))
    } else if has("permission_denied") || has("PERMISSION_DENIED") {
        ProviderErrorKind::PermissionDenied(model.to_string())
    } else if has("not_found_error") || has("NOT_FOUND") {
        ProviderErrorKind::ModelNotFound(model.to_string())
    } else if has("rate_limit") || has("RESOURCE_EXHAUSTED") || has("429") {
        ProviderErrorKind::RateLimited(model.to_string())
    } else if has("overloaded") || has("529") {
        ProviderErrorKind::Overloaded(message.to_string())
    } else if has("UNAVAILABLE") || has("503") {
        ProviderErrorKind::ServiceUnavailable(message.to_string())
    } else if has("timeout") || has("DEADLINE_EXCEEDED") {
        ProviderErrorKind::Timeout(message.to_string())
    } else {
        return None;
    };
    Some(kind)
}

/// Classify a request that never produced a response.
///
/// Timeouts and connection failures are transient. Anything else is
/// classified from its message.
#[track_caller]
pub fn classify_transport(provider: Provider, err: &reqwest::Error, model: &str) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::for_provider(
            provider.name(),
            ProviderErrorKind::Timeout(err.to_string()),
        );
    }
    if err.is_connect() || err.is_request() {
        return ProviderError::for_provider(
            provider.name(),
            ProviderErrorKind::Network(err.to_string()),
        );
    }
    if err.is_decode() {
        return ProviderError::for_provider(
            provider.name(),
            ProviderErrorKind::Parse(err.to_string()),
        );
    }
    classify(provider, err.status().map(|s| s.as_u16()), &err.to_string(), model)
}
