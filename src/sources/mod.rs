//! Identifier resolvers: DOI, ISBN and arXiv lookups returning BibTeX text.
//!
//! Every resolver implements [`Resolver`]; the [`ResolverRegistry`] maps each
//! [`IdentifierKind`] to one resolver. New services can be plugged in by
//! implementing the trait and registering the resolver, which is also how
//! tests substitute a [`MockResolver`].
//!
//! Lookups are blocking and run one at a time. Transient failures (network
//! errors, rate limiting, 5xx) are retried inside the resolver with
//! exponential backoff; anything else is returned to the caller as is.

mod arxiv;
mod doi;
mod isbn;
mod registry;

pub mod mock;

pub use arxiv::{ArxivResolver, ARXIV_API_URL};
pub use doi::{DoiResolver, DOI_BASE_URL};
pub use isbn::{IsbnResolver, OPEN_LIBRARY_BASE_URL};
pub use mock::MockResolver;
pub use registry::ResolverRegistry;

use reqwest::blocking::Response;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::utils::TransientError;

/// Kind of identifier a resolver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Doi,
    Isbn,
    Arxiv,
}

impl IdentifierKind {
    /// Returns the display name of the identifier kind
    pub fn name(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "DOI",
            IdentifierKind::Isbn => "ISBN",
            IdentifierKind::Arxiv => "arXiv ID",
        }
    }

    /// Returns the short identifier (used in logs and config keys)
    pub fn id(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "doi",
            IdentifierKind::Isbn => "isbn",
            IdentifierKind::Arxiv => "arxiv",
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Translates an identifier into raw bibliographic text.
///
/// # Implementing a New Resolver
///
/// 1. Create a struct that implements `Resolver`
/// 2. Implement `id`, `name`, `kind` and `fetch_bibtex`
/// 3. Override `normalize_id` if the identifier has several spellings
/// 4. Register it with [`ResolverRegistry::register`]
pub trait Resolver: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this resolver (e.g., "doi.org", "openlibrary")
    fn id(&self) -> &str;

    /// Human-readable name of the backing service
    fn name(&self) -> &str;

    /// Identifier kind this resolver handles
    fn kind(&self) -> IdentifierKind;

    /// Normalise a user-supplied identifier before lookup
    fn normalize_id(&self, id: &str) -> Result<String, SourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SourceError::InvalidRequest("empty identifier".to_string()));
        }
        Ok(id.to_string())
    }

    /// Fetch BibTeX text for an already normalised identifier
    fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError>;
}

/// Errors that can occur when interacting with a resolver
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, ...)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Reference not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// API error from the service
    #[error("API error: {0}")]
    Api(String),

    /// No resolver registered for an identifier kind
    #[error("No resolver registered for {0}")]
    Unsupported(IdentifierKind),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<crate::utils::ValidationError> for SourceError {
    fn from(err: crate::utils::ValidationError) -> Self {
        SourceError::InvalidRequest(err.to_string())
    }
}

/// Map a non-success HTTP status onto a [`SourceError`]
pub(crate) fn check_status(response: Response, service: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Err(SourceError::NotFound(format!(
            "{} has no record for this identifier",
            service
        )));
    }

    match TransientError::from_status(status) {
        Some(TransientError::RateLimit) => Err(SourceError::RateLimit),
        _ => Err(SourceError::Api(format!(
            "{} returned status: {}",
            service, status
        ))),
    }
}

/// Collapse whitespace and drop BibTeX grouping characters from service text
pub(crate) fn clean_text(text: &str) -> String {
    text.replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
