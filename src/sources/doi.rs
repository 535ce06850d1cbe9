//! DOI resolver using doi.org content negotiation.

use reqwest::header::ACCEPT;
use std::sync::Arc;

use crate::sources::{check_status, IdentifierKind, Resolver, SourceError};
use crate::utils::{validate_doi, with_retry, HttpClient, RetryConfig};

/// Base URL for DOI resolution
pub const DOI_BASE_URL: &str = "https://doi.org";

/// DOI resolver
///
/// Asks the DOI registration agency (Crossref, DataCite, ...) for a BibTeX
/// rendering of the record via `Accept: application/x-bibtex`.
#[derive(Debug, Clone)]
pub struct DoiResolver {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl DoiResolver {
    /// Create a resolver against doi.org
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_base_url(
            Arc::new(HttpClient::new()?),
            DOI_BASE_URL,
            RetryConfig::default(),
        ))
    }

    /// Create with a custom HTTP client and base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, base_url: &str, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }
}

impl Resolver for DoiResolver {
    fn id(&self) -> &str {
        "doi.org"
    }

    fn name(&self) -> &str {
        "DOI"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Doi
    }

    fn normalize_id(&self, id: &str) -> Result<String, SourceError> {
        Ok(validate_doi(id)?)
    }

    fn fetch_bibtex(&self, doi: &str) -> Result<String, SourceError> {
        let url = format!("{}/{}", self.base_url, doi);
        tracing::debug!("Fetching BibTeX for DOI {} from {}", doi, url);

        let body = with_retry(self.retry, || {
            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/x-bibtex")
                .send()
                .map_err(|e| SourceError::Network(format!("Failed to fetch DOI: {}", e)))?;

            check_status(response, "doi.org")?
                .text()
                .map_err(|e| SourceError::Parse(format!("Failed to read response: {}", e)))
        })?;

        let body = body.trim();
        if !body.starts_with('@') {
            return Err(SourceError::NotFound(format!(
                "no BibTeX record for DOI {}",
                doi
            )));
        }

        Ok(body.to_string())
    }
}
