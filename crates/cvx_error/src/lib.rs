//! Error types for the cvx toolkit.
//!
//! This crate provides the foundation error types used throughout the cvx workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Transient failures are tagged through the [`RetryableError`] trait rather
//! than by wrapping: the retry executor asks the error itself whether another
//! attempt may succeed, so the error a caller finally sees is always the
//! underlying one.
//!
//! # Examples
//!
//! ```
//! use cvx_error::{CvxResult, ProviderError, ProviderErrorKind};
//!
//! fn call_model() -> CvxResult<String> {
//!     Err(ProviderError::new(ProviderErrorKind::EmptyResponse))?
//! }
//!
//! match call_model() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancelled;
mod config;
mod error;
mod json;
mod provider;
mod storage;

pub use cancelled::CancelledError;
pub use config::ConfigError;
pub use error::{CvxError, CvxErrorKind, CvxResult};
pub use json::JsonError;
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult, RetryableError};
pub use storage::{StorageError, StorageErrorKind};
