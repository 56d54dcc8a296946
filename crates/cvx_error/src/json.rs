//! JSON error types.

/// A JSON payload could not be produced or understood.
///
/// Raised when an agent input cannot be serialised, or when a model reply
/// is not the `{"cv": {...}, "letter": {...}}` object a build expects.
/// Malformed replies are fatal to the build but are never cached.
///
/// # Examples
///
/// ```
/// use cvx_error::{CvxError, CvxErrorKind, JsonError};
///
/// let err: CvxError = JsonError::new("invalid output: missing cv or letter fields").into();
/// assert!(matches!(err.kind(), CvxErrorKind::Json(_)));
/// assert!(err.to_string().contains("missing cv or letter"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// What was wrong with the payload
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a new JsonError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
