//! Mock resolver for testing purposes.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::sources::{IdentifierKind, Resolver, SourceError};

/// A mock resolver that returns predefined BibTeX text and records lookups.
#[derive(Debug)]
pub struct MockResolver {
    kind: IdentifierKind,
    records: Mutex<HashMap<String, String>>,
    lookups: Mutex<Vec<String>>,
}

impl MockResolver {
    /// Create a new mock resolver for an identifier kind.
    pub fn new(kind: IdentifierKind) -> Self {
        Self {
            kind,
            records: Mutex::new(HashMap::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Add a record to return for an identifier.
    pub fn with_record(self, id: &str, bibtex: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(id.to_string(), bibtex.to_string());
        self
    }

    /// Identifiers looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Resolver for MockResolver {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Resolver"
    }

    fn kind(&self) -> IdentifierKind {
        self.kind
    }

    fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError> {
        self.lookups.lock().unwrap().push(id.to_string());
        self.records
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("mock has no record for {}", id)))
    }
}
