//! ISBN resolver using the Open Library Books API.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::bibtex;
use crate::models::BibEntry;
use crate::sources::{check_status, clean_text, IdentifierKind, Resolver, SourceError};
use crate::utils::{validate_isbn, with_retry, HttpClient, RetryConfig};

/// Base URL for Open Library
pub const OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";

/// ISBN resolver
///
/// Open Library answers with JSON; the record is converted into a `@book`
/// entry.
#[derive(Debug, Clone)]
pub struct IsbnResolver {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl IsbnResolver {
    /// Create a resolver against openlibrary.org
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_base_url(
            Arc::new(HttpClient::new()?),
            OPEN_LIBRARY_BASE_URL,
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

    fn to_entry(isbn: &str, book: OLBook) -> Result<BibEntry, SourceError> {
        let title = match (book.title, book.subtitle) {
            (Some(title), Some(subtitle)) => format!("{}: {}", title, subtitle),
            (Some(title), None) => title,
            (None, _) => {
                return Err(SourceError::Parse("Open Library record has no title".to_string()))
            }
        };

        let mut entry = BibEntry::new("book").with_field("title", clean_text(&title));
        entry.authors = book.authors.iter().map(|a| clean_text(&a.name)).collect();
        entry.set("isbn", isbn);

        if let Some(publisher) = book.publishers.first() {
            entry.set("publisher", clean_text(&publisher.name));
        }
        if let Some(place) = book.publish_places.first() {
            entry.set("address", clean_text(&place.name));
        }
        if let Some(year) = book.publish_date.as_deref().and_then(extract_year) {
            entry.set("year", year);
        }
        if let Some(pages) = book.number_of_pages {
            entry.set("pagetotal", pages.to_string());
        }
        if let Some(url) = book.url {
            entry.set("url", url);
        }

        Ok(entry)
    }
}

fn extract_year(date: &str) -> Option<String> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"))
        .captures(date)
        .map(|c| c[1].to_string())
}

impl Resolver for IsbnResolver {
    fn id(&self) -> &str {
        "openlibrary"
    }

    fn name(&self) -> &str {
        "Open Library"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Isbn
    }

    fn normalize_id(&self, id: &str) -> Result<String, SourceError> {
        Ok(validate_isbn(id)?)
    }

    fn fetch_bibtex(&self, isbn: &str) -> Result<String, SourceError> {
        let bibkey = format!("ISBN:{}", isbn);
        let url = format!(
            "{}/api/books?bibkeys={}&format=json&jscmd=data",
            self.base_url,
            urlencoding::encode(&bibkey)
        );
        tracing::debug!("Fetching Open Library record for ISBN {}", isbn);

        let mut books: HashMap<String, OLBook> = with_retry(self.retry, || {
            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| SourceError::Network(format!("Failed to query Open Library: {}", e)))?;

            check_status(response, "Open Library")?
                .json()
                .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))
        })?;

        let book = books
            .remove(&bibkey)
            .ok_or_else(|| SourceError::NotFound(format!("no Open Library record for ISBN {}", isbn)))?;

        Ok(bibtex::encode(&Self::to_entry(isbn, book)?))
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Deserialize)]
struct OLBook {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<OLNamed>,
    #[serde(default)]
    publishers: Vec<OLNamed>,
    #[serde(default)]
    publish_places: Vec<OLNamed>,
    publish_date: Option<String>,
    number_of_pages: Option<u32>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OLNamed {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNUTH: &str = r#"{
      "ISBN:9780201896831": {
        "url": "https://openlibrary.org/books/OL1M/the_art_of_computer_programming",
        "title": "The Art of Computer Programming",
        "subtitle": "Fundamental Algorithms",
        "authors": [{"url": "https://openlibrary.org/authors/OL1A", "name": "Donald E. Knuth"}],
        "publishers": [{"name": "Addison-Wesley"}],
        "publish_places": [{"name": "Reading, Mass"}],
        "publish_date": "July 1997",
        "number_of_pages": 650
      }
    }"#;

    fn resolver(server: &mockito::Server) -> IsbnResolver {
        IsbnResolver::with_base_url(
            Arc::new(HttpClient::new().unwrap()),
            &server.url(),
            RetryConfig::none(),
        )
    }

    #[test]
    fn test_fetch_bibtex_builds_book_entry() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/books")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("bibkeys".into(), "ISBN:9780201896831".into()),
                mockito::Matcher::UrlEncoded("jscmd".into(), "data".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(KNUTH)
            .create();

        let raw = resolver(&server).fetch_bibtex("9780201896831").unwrap();
        mock.assert();

        let entry = bibtex::decode(&raw).unwrap();
        assert_eq!(entry.entry_type, "book");
        assert_eq!(entry.title(), Some("The Art of Computer Programming: Fundamental Algorithms"));
        assert_eq!(entry.authors, vec!["Donald E. Knuth"]);
        assert_eq!(entry.get("publisher"), Some("Addison-Wesley"));
        assert_eq!(entry.year(), Some("1997"));
        assert_eq!(entry.get("isbn"), Some("9780201896831"));
    }

    #[test]
    fn test_fetch_keeps_corporate_author_whole() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/books")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"ISBN:0000000000": {"title": "Catalogue", "authors": [{"name": "Barnes and Noble"}, {"name": "Jane Doe"}]}}"#,
            )
            .create();

        let raw = resolver(&server).fetch_bibtex("0000000000").unwrap();

        let entry = bibtex::decode(&raw).unwrap();
        assert_eq!(entry.authors, vec!["Barnes and Noble", "Jane Doe"]);
    }

    #[test]
    fn test_fetch_unknown_isbn_is_not_found() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/books")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create();

        let result = resolver(&server).fetch_bibtex("0000000000");
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("July 1997").as_deref(), Some("1997"));
        assert_eq!(extract_year("1997-07-01").as_deref(), Some("1997"));
        assert_eq!(extract_year("n.d."), None);
    }
}
