//! Cancellation error type.

/// The caller gave up before the operation finished.
///
/// Returned when a cancellation signal fires while a task is suspended in a
/// rate-limit wait or a retry backoff. It is kept distinct from operation
/// failures so callers can tell the two apart.
///
/// # Examples
///
/// ```
/// use cvx_error::CancelledError;
///
/// let err = CancelledError::new("rate limiter wait");
/// assert!(format!("{}", err).contains("rate limiter wait"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cancelled: {} at line {} in {}", operation, line, file)]
pub struct CancelledError {
    /// What was in progress when cancellation arrived
    pub operation: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CancelledError {
    /// Create a new CancelledError for the given operation at the current location.
    #[track_caller]
    pub fn new(operation: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            operation: operation.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
