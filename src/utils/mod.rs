//! Utility modules supporting ingestion.
//!
//! - [`HttpClient`]: Blocking HTTP client shared by the resolvers
//! - [`RetryConfig`] / [`with_retry`]: Retry transient resolver failures with exponential backoff
//! - [`validate_doi`], [`validate_isbn`], [`normalize_arxiv_id`]: Identifier normalisation
//! - [`sanitize_filename`]: Safe names for documents stored in the repository
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use bibshelf::utils::{with_retry, RetryConfig};
//! use bibshelf::sources::SourceError;
//!
//! # fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! let config = RetryConfig::default().max_attempts(3);
//! let result = with_retry(config, fetch_data);
//! ```

mod http;
mod retry;
mod validate;

pub use http::{HttpClient, DEFAULT_TIMEOUT_SECS};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use validate::{
    normalize_arxiv_id, sanitize_filename, validate_doi, validate_isbn, ValidationError,
};
