//! arXiv resolver using the arXiv Atom API.

use chrono::Datelike;
use feed_rs::parser;
use std::sync::Arc;

use crate::bibtex;
use crate::models::BibEntry;
use crate::sources::{check_status, clean_text, IdentifierKind, Resolver, SourceError};
use crate::utils::{normalize_arxiv_id, with_retry, HttpClient, RetryConfig};

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// arXiv resolver
///
/// The API answers with an Atom feed; the single entry is converted into a
/// `@misc` entry carrying the `eprint`, `archiveprefix` and `primaryclass`
/// fields used by biblatex.
#[derive(Debug, Clone)]
pub struct ArxivResolver {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl ArxivResolver {
    /// Create a resolver against export.arxiv.org
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_base_url(
            Arc::new(HttpClient::new()?),
            ARXIV_API_URL,
            RetryConfig::default(),
        ))
    }

    /// Create with a custom HTTP client and base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, base_url: &str, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            retry,
        }
    }

    /// Parse an arXiv Atom feed entry into a bibliographic entry
    fn parse_entry(id: &str, entry: &feed_rs::model::Entry) -> Result<BibEntry, SourceError> {
        let title = entry
            .title
            .as_ref()
            .map(|t| clean_text(&t.content))
            .unwrap_or_default();

        // arXiv reports lookup failures as a feed entry titled "Error"
        if title.is_empty() || title == "Error" || entry.id.contains("/api/errors") {
            return Err(SourceError::NotFound(format!("arXiv has no record for {}", id)));
        }

        let mut bib = BibEntry::new("misc").with_field("title", title);
        bib.authors = entry.authors.iter().map(|a| clean_text(&a.name)).collect();
        bib.set("eprint", id);
        bib.set("archiveprefix", "arXiv");
        bib.set("url", entry.id.clone());

        if let Some(published) = entry.published {
            bib.set("year", published.year().to_string());
        }
        if let Some(category) = entry.categories.first() {
            bib.set("primaryclass", category.term.clone());
        }
        if let Some(summary) = &entry.summary {
            bib.set("abstract", clean_text(&summary.content));
        }

        // Published versions carry a link titled "doi"
        let doi = entry
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("doi"))
            .and_then(|l| l.href.split("doi.org/").nth(1));
        if let Some(doi) = doi {
            bib.set("doi", doi);
        }

        Ok(bib)
    }
}

impl Resolver for ArxivResolver {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Arxiv
    }

    fn normalize_id(&self, id: &str) -> Result<String, SourceError> {
        Ok(normalize_arxiv_id(id)?)
    }

    fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError> {
        let url = format!(
            "{}?id_list={}&max_results=1",
            self.base_url,
            urlencoding::encode(id)
        );
        tracing::debug!("Fetching arXiv record for {}", id);

        let bytes = with_retry(self.retry, || {
            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| SourceError::Network(format!("Failed to query arXiv: {}", e)))?;

            check_status(response, "arXiv")?
                .bytes()
                .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
        })?;

        let feed = parser::parse(bytes.as_ref())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let entry = feed
            .entries
            .first()
            .ok_or_else(|| SourceError::NotFound(format!("arXiv has no record for {}", id)))?;

        Ok(bibtex::encode(&Self::parse_entry(id, entry)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: id_list=1706.03762</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2023-08-02T00:00:00-04:00</updated>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex recurrent networks.
    </summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <link title="doi" href="http://dx.doi.org/10.5555/3295222.3295349" rel="related"/>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: id_list=9999.99999</title>
  <id>http://arxiv.org/api/err</id>
  <updated>2023-08-02T00:00:00-04:00</updated>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_9999.99999</id>
    <title>Error</title>
    <summary>incorrect id format for 9999.99999</summary>
    <updated>2023-08-02T00:00:00-04:00</updated>
    <author><name>arXiv api core</name></author>
  </entry>
</feed>"#;

    fn resolver(server: &mockito::Server) -> ArxivResolver {
        ArxivResolver::with_base_url(
            Arc::new(HttpClient::new().unwrap()),
            &format!("{}/api/query", server.url()),
            RetryConfig::none(),
        )
    }

    #[test]
    fn test_fetch_bibtex_from_atom() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::UrlEncoded(
                "id_list".into(),
                "1706.03762".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create();

        let raw = resolver(&server).fetch_bibtex("1706.03762").unwrap();
        mock.assert();

        let entry = bibtex::decode(&raw).unwrap();
        assert_eq!(entry.entry_type, "misc");
        assert_eq!(entry.title(), Some("Attention Is All You Need"));
        assert_eq!(entry.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(entry.year(), Some("2017"));
        assert_eq!(entry.get("eprint"), Some("1706.03762"));
        assert_eq!(entry.get("primaryclass"), Some("cs.CL"));
        assert_eq!(entry.get("doi"), Some("10.5555/3295222.3295349"));
    }

    #[test]
    fn test_error_entry_is_not_found() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(ERROR_FEED)
            .create();

        let result = resolver(&server).fetch_bibtex("9999.99999");
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create();

        let result = resolver(&server).fetch_bibtex("1706.03762");
        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
