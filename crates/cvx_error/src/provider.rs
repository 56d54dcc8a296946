//! AI provider error types and the retry tag.

use crate::CancelledError;

/// AI provider error conditions.
///
/// Variants split into two groups. Transient conditions (rate limiting,
/// overload, unavailability, timeouts, network failures) may succeed on a
/// later attempt; everything else is permanent and must surface on the first
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// API key not found in environment
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// Credentials were rejected
    #[display("invalid API key. {}", _0)]
    Authentication(String),
    /// Credentials lack access to the requested model
    #[display("key does not have access to model {:?}. Check your account permissions", _0)]
    PermissionDenied(String),
    /// Requested model does not exist
    #[display("model {:?} not found. Verify the model name is correct", _0)]
    ModelNotFound(String),
    /// Request was malformed
    #[display("bad request: {}", _0)]
    BadRequest(String),
    /// Provider rate limit hit for the named model
    #[display("rate limit exceeded for model {:?}. Please wait and try again", _0)]
    RateLimited(String),
    /// Provider overloaded (e.g. HTTP 529)
    #[display("service overloaded. Please try again later ({})", _0)]
    Overloaded(String),
    /// Provider temporarily unavailable (e.g. HTTP 503)
    #[display("service unavailable: {}", _0)]
    ServiceUnavailable(String),
    /// Request timed out
    #[display("request timed out: {}", _0)]
    Timeout(String),
    /// Connection-level failure
    #[display("network error: {}", _0)]
    Network(String),
    /// Any other HTTP failure
    #[display("HTTP {} error: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
    /// Response carried no usable text
    #[display("no text content in response")]
    EmptyResponse,
    /// Response body could not be decoded
    #[display("failed to parse response: {}", _0)]
    Parse(String),
    /// Agent name not recognised by any provider
    #[display("unknown agent: {} (use claude, gemini, gemini-*, or claude-*)", _0)]
    UnknownAgent(String),
    /// Agent exists but cannot be reached this way
    #[display("unsupported agent: {}", _0)]
    Unsupported(String),
    /// Caller cancelled the request
    #[display("cancelled: {}", _0)]
    Cancelled(String),
}

impl ProviderErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited(_)
                | ProviderErrorKind::Overloaded(_)
                | ProviderErrorKind::ServiceUnavailable(_)
                | ProviderErrorKind::Timeout(_)
                | ProviderErrorKind::Network(_)
        )
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use cvx_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::MissingApiKey("GEMINI_API_KEY".into()));
/// assert!(format!("{}", err).contains("GEMINI_API_KEY"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("{} API error: {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    /// Provider that produced the error ("claude", "gemini", ...)
    pub provider: &'static str,
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        Self::for_provider("provider", kind)
    }

    /// Create a new ProviderError attributed to a named provider.
    #[track_caller]
    pub fn for_provider(provider: &'static str, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the error records a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Cancelled(_))
    }
}

impl From<CancelledError> for ProviderError {
    #[track_caller]
    fn from(err: CancelledError) -> Self {
        Self::new(ProviderErrorKind::Cancelled(err.operation))
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Trait for errors that carry a retry classification.
///
/// The retry executor consults this tag after every failed attempt. Errors
/// reporting `false` end the retry loop immediately.
///
/// # Examples
///
/// ```
/// use cvx_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let overloaded = ProviderError::new(ProviderErrorKind::Overloaded("529".into()));
/// assert!(overloaded.is_retryable());
///
/// let bad_key = ProviderError::new(ProviderErrorKind::Authentication("check key".into()));
/// assert!(!bad_key.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like 503 (service unavailable), 429 (rate limit),
    /// or network timeouts should return true. Permanent errors like 401
    /// (unauthorized) or 400 (bad request) should return false.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
