//! Paper model: a bibliographic entry stored under a citekey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::BibEntry;

/// A paper as held by the repository
///
/// The citekey is unique across the repository. Tags and the document
/// reference are attached during ingestion; afterwards the paper belongs
/// to the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Unique identifier within the repository
    pub citekey: String,

    /// Bibliographic data
    pub bibentry: BibEntry,

    /// Tags (order irrelevant)
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// When the paper was added; used for default ordering
    pub added: DateTime<Utc>,

    /// Document reference (`docsdir://name.ext` for stored copies, a path for links)
    #[serde(default)]
    pub docpath: Option<String>,
}

impl Paper {
    /// Create a paper from a validated entry, stamped with the current time
    pub fn new(citekey: impl Into<String>, bibentry: BibEntry) -> Self {
        Self::added_at(citekey, bibentry, Utc::now())
    }

    /// Create a paper with an explicit `added` timestamp
    pub fn added_at(citekey: impl Into<String>, bibentry: BibEntry, added: DateTime<Utc>) -> Self {
        Self {
            citekey: citekey.into(),
            bibentry,
            tags: BTreeSet::new(),
            added,
            docpath: None,
        }
    }

    /// Replace the tag set
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check if a document is attached
    pub fn has_document(&self) -> bool {
        self.docpath.is_some()
    }
}

/// Split a comma-separated tag string into a deduplicated set
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
