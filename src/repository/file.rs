//! Directory-backed repository.
//!
//! Layout under the repository root:
//!
//! ```text
//! papers/<citekey>.json   one serialized Paper per file
//! doc/<citekey>.<ext>     copied or moved documents
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::{alpha_suffix, RepoError, Repository};
use crate::config::DocAddMode;
use crate::models::Paper;
use crate::utils::sanitize_filename;

/// Prefix of document references stored inside the repository
pub const DOCSDIR_PREFIX: &str = "docsdir://";

/// Repository rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    /// Open an existing repository
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let repo = Self { root: root.into() };
        if !repo.papers_dir().is_dir() {
            return Err(RepoError::Uninitialized(repo.root));
        }
        Ok(repo)
    }

    /// Create the repository directories if needed and open the repository
    pub fn init(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let repo = Self { root: root.into() };
        fs::create_dir_all(repo.papers_dir())?;
        fs::create_dir_all(repo.doc_dir())?;
        tracing::info!("Initialized repository at {}", repo.root.display());
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn papers_dir(&self) -> PathBuf {
        self.root.join("papers")
    }

    pub fn doc_dir(&self) -> PathBuf {
        self.root.join("doc")
    }

    fn paper_path(&self, citekey: &str) -> PathBuf {
        self.papers_dir().join(format!("{}.json", citekey))
    }

    /// Turn a stored document reference into a filesystem path
    pub fn resolve_docpath(&self, docpath: &str) -> PathBuf {
        match docpath.strip_prefix(DOCSDIR_PREFIX) {
            Some(name) => self.doc_dir().join(name),
            None => PathBuf::from(docpath),
        }
    }

    fn load_paper(&self, citekey: &str) -> Result<Paper, RepoError> {
        let path = self.paper_path(citekey);
        if !path.is_file() {
            return Err(RepoError::NotFound(citekey.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn write_paper(&self, paper: &Paper) -> Result<(), RepoError> {
        let json = serde_json::to_string_pretty(paper)?;
        fs::write(self.paper_path(&paper.citekey), json)?;
        Ok(())
    }

    /// Copy a document into `doc/`, returning its stored reference
    ///
    /// Distinct citekeys may sanitize to the same stem, so an alphabetic
    /// suffix is appended until the target name is free.
    fn store_doc(&self, citekey: &str, source: &Path) -> Result<String, RepoError> {
        let stem = doc_stem(citekey);
        let ext = source.extension().and_then(|e| e.to_str());
        let file_name = |stem: &str| match ext {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.to_string(),
        };

        fs::create_dir_all(self.doc_dir())?;
        let name = std::iter::once(file_name(&stem))
            .chain((1..).map(|n| file_name(&format!("{}{}", stem, alpha_suffix(n)))))
            .find(|name| !self.doc_dir().join(name).exists())
            .unwrap_or_else(|| file_name(&stem));

        fs::copy(source, self.doc_dir().join(&name))?;
        Ok(format!("{}{}", DOCSDIR_PREFIX, name))
    }
}

fn doc_stem(citekey: &str) -> String {
    let stem = sanitize_filename(citekey).unwrap_or_else(|_| {
        citekey
            .chars()
            .filter(|&ch| ch.is_alphanumeric() || ch == '-' || ch == '_')
            .collect()
    });
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

impl Repository for FileRepository {
    fn contains(&self, citekey: &str) -> bool {
        self.paper_path(citekey).exists()
    }

    fn push_paper(&mut self, paper: &Paper) -> Result<(), RepoError> {
        if self.contains(&paper.citekey) {
            return Err(RepoError::DuplicateKey(paper.citekey.clone()));
        }
        self.write_paper(paper)?;
        tracing::debug!("Stored paper {}", paper.citekey);
        Ok(())
    }

    fn push_doc(
        &mut self,
        citekey: &str,
        path: &Path,
        mode: DocAddMode,
    ) -> Result<String, RepoError> {
        let mut paper = self.load_paper(citekey)?;
        if !path.is_file() {
            return Err(RepoError::MissingDocument(path.to_path_buf()));
        }

        let docpath = match mode {
            DocAddMode::Copy => self.store_doc(citekey, path)?,
            DocAddMode::Move => {
                let docpath = self.store_doc(citekey, path)?;
                fs::remove_file(path)?;
                docpath
            }
            DocAddMode::Link => fs::canonicalize(path)?.to_string_lossy().into_owned(),
        };

        paper.docpath = Some(docpath.clone());
        self.write_paper(&paper)?;
        tracing::debug!("Attached {} to {} ({:?})", docpath, citekey, mode);
        Ok(docpath)
    }

    fn all_papers(&self) -> Result<Vec<Paper>, RepoError> {
        let mut papers = Vec::new();
        for entry in fs::read_dir(self.papers_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match serde_json::from_str::<Paper>(&fs::read_to_string(&path)?) {
                Ok(paper) => papers.push(paper),
                Err(e) => tracing::warn!("Skipping unreadable paper {}: {}", path.display(), e),
            }
        }
        papers.sort_by(|a, b| a.citekey.cmp(&b.citekey));
        Ok(papers)
    }
}
