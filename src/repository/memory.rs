//! In-memory repository for testing purposes.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::{RepoError, Repository};
use crate::config::DocAddMode;
use crate::models::Paper;

/// A repository that keeps papers in memory and records every call
#[derive(Debug, Default)]
pub struct MemoryRepository {
    papers: Vec<Paper>,
    docs: Vec<(String, PathBuf, DocAddMode)>,
    calls: RefCell<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with papers already stored
    pub fn with_papers(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            ..Self::default()
        }
    }

    /// Stored papers, in insertion order
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Documents pushed so far
    pub fn docs(&self) -> &[(String, PathBuf, DocAddMode)] {
        &self.docs
    }

    /// Names of the trait methods called so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: &str) {
        self.calls.borrow_mut().push(call.to_string());
    }
}

impl Repository for MemoryRepository {
    fn contains(&self, citekey: &str) -> bool {
        self.record("contains");
        self.papers.iter().any(|p| p.citekey == citekey)
    }

    fn push_paper(&mut self, paper: &Paper) -> Result<(), RepoError> {
        self.record("push_paper");
        if self.papers.iter().any(|p| p.citekey == paper.citekey) {
            return Err(RepoError::DuplicateKey(paper.citekey.clone()));
        }
        self.papers.push(paper.clone());
        Ok(())
    }

    fn push_doc(
        &mut self,
        citekey: &str,
        path: &Path,
        mode: DocAddMode,
    ) -> Result<String, RepoError> {
        self.record("push_doc");
        let paper = self
            .papers
            .iter_mut()
            .find(|p| p.citekey == citekey)
            .ok_or_else(|| RepoError::NotFound(citekey.to_string()))?;

        let docpath = path.to_string_lossy().into_owned();
        paper.docpath = Some(docpath.clone());
        self.docs.push((citekey.to_string(), path.to_path_buf(), mode));
        Ok(docpath)
    }

    fn all_papers(&self) -> Result<Vec<Paper>, RepoError> {
        self.record("all_papers");
        Ok(self.papers.clone())
    }
}
