//! Bibliographic entry model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded and validated bibliographic entry.
///
/// `author` is kept apart from the other fields because it is the only
/// field holding a sequence; everything else is scalar text keyed by the
/// lower-cased BibTeX field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    /// Entry type, lower-cased (`article`, `book`, `misc`, ...)
    pub entry_type: String,

    /// Key written in the source text, if any
    #[serde(default)]
    pub key: Option<String>,

    /// Authors in source order, as written (`Last, First` or `First Last`)
    #[serde(default)]
    pub authors: Vec<String>,

    /// All other fields
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    /// Create an empty entry of the given type
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            key: None,
            authors: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Set the source key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Append an author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Set a scalar field
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a scalar field; the name is lower-cased
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    /// Value of a scalar field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether the entry carries an `author` field
    pub fn has_authors(&self) -> bool {
        !self.authors.is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    /// Last names of all authors, in order
    pub fn author_last_names(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(|a| last_name(a))
    }
}

/// Last name of a person as written in BibTeX.
///
/// `Last, First` yields the part before the first comma; `First Last` yields
/// the final word.
pub fn last_name(person: &str) -> &str {
    let person = person.trim();
    match person.split_once(',') {
        Some((last, _)) => last.trim(),
        None => person.split_whitespace().last().unwrap_or(person),
    }
}
