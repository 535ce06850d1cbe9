//! Registry mapping identifier kinds to resolvers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::{ArxivResolver, DoiResolver, IdentifierKind, IsbnResolver, Resolver, SourceError};
use crate::config::ResolversConfig;
use crate::utils::{HttpClient, RetryConfig};

/// Registry of the resolvers available to the ingestion pipeline
#[derive(Debug, Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<IdentifierKind, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry with the DOI, ISBN and arXiv resolvers
    pub fn from_config(config: &ResolversConfig) -> Result<Self, SourceError> {
        for base in [&config.doi_url, &config.isbn_url, &config.arxiv_url] {
            check_base_url(base)?;
        }

        let client = Arc::new(HttpClient::with_timeout(Duration::from_secs(
            config.timeout_secs,
        ))?);
        let retry = RetryConfig::default().max_attempts(config.max_retries + 1);

        let mut registry = Self::empty();
        registry.register(Arc::new(DoiResolver::with_base_url(
            Arc::clone(&client),
            &config.doi_url,
            retry,
        )));
        registry.register(Arc::new(IsbnResolver::with_base_url(
            Arc::clone(&client),
            &config.isbn_url,
            retry,
        )));
        registry.register(Arc::new(ArxivResolver::with_base_url(
            client,
            &config.arxiv_url,
            retry,
        )));

        Ok(registry)
    }

    /// Register a resolver, replacing any previous one of the same kind
    pub fn register(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.insert(resolver.kind(), resolver);
    }

    /// Get the resolver for an identifier kind
    pub fn get(&self, kind: IdentifierKind) -> Option<&Arc<dyn Resolver>> {
        self.resolvers.get(&kind)
    }

    /// Get the resolver for an identifier kind, returning an error if none is registered
    pub fn get_required(&self, kind: IdentifierKind) -> Result<&Arc<dyn Resolver>, SourceError> {
        self.get(kind).ok_or(SourceError::Unsupported(kind))
    }

    /// Get the number of registered resolvers
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

/// Reject resolver base URLs that are not absolute http(s) URLs
fn check_base_url(base: &str) -> Result<(), SourceError> {
    let url = Url::parse(base)
        .map_err(|e| SourceError::InvalidRequest(format!("invalid resolver URL {}: {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(SourceError::InvalidRequest(format!(
            "unsupported scheme {} in resolver URL {}",
            scheme, base
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockResolver;

    #[test]
    fn test_registry_from_config() {
        let registry = ResolverRegistry::from_config(&ResolversConfig::default()).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(IdentifierKind::Doi).unwrap().id(), "doi.org");
        assert_eq!(registry.get(IdentifierKind::Isbn).unwrap().id(), "openlibrary");
        assert_eq!(registry.get(IdentifierKind::Arxiv).unwrap().id(), "arxiv");
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = ResolverRegistry::empty();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get_required(IdentifierKind::Doi),
            Err(SourceError::Unsupported(IdentifierKind::Doi))
        ));

        registry.register(Arc::new(MockResolver::new(IdentifierKind::Doi)));
        registry.register(Arc::new(MockResolver::new(IdentifierKind::Doi)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_required(IdentifierKind::Doi).unwrap().id(), "mock");
    }

    #[test]
    fn test_from_config_rejects_bad_urls() {
        let config = ResolversConfig {
            doi_url: "not a url".to_string(),
            ..ResolversConfig::default()
        };
        assert!(matches!(
            ResolverRegistry::from_config(&config),
            Err(SourceError::InvalidRequest(_))
        ));

        let config = ResolversConfig {
            isbn_url: "ftp://openlibrary.org".to_string(),
            ..ResolversConfig::default()
        };
        assert!(ResolverRegistry::from_config(&config).is_err());
    }
}
