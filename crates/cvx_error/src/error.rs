//! Top-level error wrapper types.

use crate::{
    CancelledError, ConfigError, JsonError, ProviderError, RetryableError, StorageError,
};

/// Every error family in the workspace.
///
/// # Examples
///
/// ```
/// use cvx_error::{CvxError, ConfigError};
///
/// let config_err = ConfigError::new("multiplier must be greater than 1");
/// let err: CvxError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CvxErrorKind {
    /// AI provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Cache storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Operation cancelled by the caller
    #[from(CancelledError)]
    Cancelled(CancelledError),
}

/// cvx error with kind discrimination.
///
/// # Examples
///
/// ```
/// use cvx_error::{CvxResult, StorageError, StorageErrorKind};
///
/// fn might_fail() -> CvxResult<()> {
///     Err(StorageError::new(StorageErrorKind::FileWrite("disk full".into())))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("cvx Error: {}", _0)]
pub struct CvxError(Box<CvxErrorKind>);

impl CvxError {
    /// Create a new error from a kind.
    pub fn new(kind: CvxErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CvxErrorKind {
        &self.0
    }

    /// True when the caller gave up, as opposed to the operation failing.
    pub fn is_cancelled(&self) -> bool {
        match self.kind() {
            CvxErrorKind::Cancelled(_) => true,
            CvxErrorKind::Provider(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to CvxErrorKind
impl<T> From<T> for CvxError
where
    T: Into<CvxErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for CvxError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            CvxErrorKind::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for cvx operations.
pub type CvxResult<T> = std::result::Result<T, CvxError>;
