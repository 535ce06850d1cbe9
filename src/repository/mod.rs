//! Paper and document storage.
//!
//! The ingestion pipeline only talks to the [`Repository`] trait: membership
//! checks, unique key assignment, and pushing papers and documents.
//! [`FileRepository`] keeps one JSON file per paper under the repository root;
//! [`MemoryRepository`] keeps everything in memory and records calls for tests.

mod file;
mod memory;

pub use file::{FileRepository, DOCSDIR_PREFIX};
pub use memory::MemoryRepository;

use std::path::{Path, PathBuf};

use crate::config::DocAddMode;
use crate::models::Paper;

/// Storage backend for papers and their documents
pub trait Repository {
    /// Whether a paper with this citekey is stored
    fn contains(&self, citekey: &str) -> bool;

    /// First free key among `base`, `basea` .. `basez`, `baseaa` ..
    fn unique_citekey(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", base, alpha_suffix(n)))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Store a new paper; fails if the citekey is taken
    fn push_paper(&mut self, paper: &Paper) -> Result<(), RepoError>;

    /// Attach a document to a stored paper, returning the recorded reference
    fn push_doc(&mut self, citekey: &str, path: &Path, mode: DocAddMode)
        -> Result<String, RepoError>;

    /// Every stored paper, in collection order
    fn all_papers(&self) -> Result<Vec<Paper>, RepoError>;
}

/// Bijective base-26 suffix: 1 -> "a", 26 -> "z", 27 -> "aa"
pub fn alpha_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A paper with citekey {0} already exists")]
    DuplicateKey(String),

    #[error("No paper with citekey {0}")]
    NotFound(String),

    #[error("Document not found: {}", .0.display())]
    MissingDocument(PathBuf),

    #[error("No repository at {} (run `bibshelf init`)", .0.display())]
    Uninitialized(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BibEntry;

    #[test]
    fn test_alpha_suffix() {
        assert_eq!(alpha_suffix(1), "a");
        assert_eq!(alpha_suffix(2), "b");
        assert_eq!(alpha_suffix(26), "z");
        assert_eq!(alpha_suffix(27), "aa");
        assert_eq!(alpha_suffix(52), "az");
        assert_eq!(alpha_suffix(53), "ba");
        assert_eq!(alpha_suffix(702), "zz");
        assert_eq!(alpha_suffix(703), "aaa");
    }

    #[test]
    fn test_unique_citekey_walks_suffixes() {
        let mut repo = MemoryRepository::new();
        assert_eq!(repo.unique_citekey("Smith2020"), "Smith2020");

        let entry = BibEntry::new("article").with_field("title", "T");
        repo.push_paper(&Paper::new("Smith2020", entry.clone())).unwrap();
        assert_eq!(repo.unique_citekey("Smith2020"), "Smith2020a");

        repo.push_paper(&Paper::new("Smith2020a", entry.clone())).unwrap();
        repo.push_paper(&Paper::new("Smith2020b", entry)).unwrap();
        assert_eq!(repo.unique_citekey("Smith2020"), "Smith2020c");
    }
}
