//! The add pipeline.
//!
//! [`Ingestor::add`] reconciles the input source into one entry, assigns a
//! unique citekey, decides which document file (if any) belongs to the paper,
//! and persists both through the [`Repository`].

mod source;

pub use source::{reconcile, AbortReason, BibSource, Reconciled};

use std::path::PathBuf;

use crate::bibtex::{derive_citekey, extract_docfile, is_valid_citekey, DecodeError};
use crate::config::{expand_tilde, DocAddMode};
use crate::models::{parse_tags, Paper};
use crate::repository::{RepoError, Repository};
use crate::sources::{IdentifierKind, ResolverRegistry};
use crate::ui::pretty::paper_oneliner;
use crate::ui::{Ui, UiError};

/// Ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid {kind} {id} or unable to retrieve bibfile from it ({reason})")]
    ReferenceNotFound {
        kind: IdentifierKind,
        id: String,
        reason: String,
    },

    #[error("invalid bibfile {}: {error}", path.display())]
    InvalidBibData {
        path: PathBuf,
        #[source]
        error: DecodeError,
    },

    #[error("citekey already exist {0}")]
    DuplicateKey(String),

    #[error("invalid citekey {0}")]
    InvalidCitekey(String),

    #[error("document file {} does not exist", .0.display())]
    MissingDocument(PathBuf),

    #[error("cannot read {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Ui(#[from] UiError),
}

/// Everything `add` was asked to do
#[derive(Debug, Clone, PartialEq)]
pub struct AddRequest {
    pub source: BibSource,
    /// Explicit document file; wins over one named in the entry
    pub docfile: Option<PathBuf>,
    /// Comma-separated tags
    pub tags: Option<String>,
    /// Explicit citekey; must not exist yet
    pub citekey: Option<String>,
    /// Per-invocation document policy; the configured default otherwise
    pub doc_mode: Option<DocAddMode>,
}

impl AddRequest {
    /// Request with only a source set
    pub fn new(source: BibSource) -> Self {
        Self {
            source,
            docfile: None,
            tags: None,
            citekey: None,
            doc_mode: None,
        }
    }
}

/// Result of an `add`
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Paper),
    Aborted(AbortReason),
}

/// Drives one ingestion against a repository
pub struct Ingestor<'a> {
    repo: &'a mut dyn Repository,
    resolvers: &'a ResolverRegistry,
    ui: &'a mut dyn Ui,
    default_mode: DocAddMode,
    color: bool,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        repo: &'a mut dyn Repository,
        resolvers: &'a ResolverRegistry,
        ui: &'a mut dyn Ui,
        default_mode: DocAddMode,
    ) -> Self {
        Self {
            repo,
            resolvers,
            ui,
            default_mode,
            color: false,
        }
    }

    /// Style the confirmation line
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Add one paper
    pub fn add(&mut self, request: AddRequest) -> Result<AddOutcome, IngestError> {
        let entry = match reconcile(&request.source, self.resolvers, &mut *self.ui)? {
            Reconciled::Entry(entry) => entry,
            Reconciled::Aborted(reason) => {
                tracing::info!("Interactive add aborted ({:?})", reason);
                return Ok(AddOutcome::Aborted(reason));
            }
        };

        let citekey = match request.citekey {
            Some(key) => {
                if !is_valid_citekey(&key) {
                    return Err(IngestError::InvalidCitekey(key));
                }
                if self.repo.contains(&key) {
                    return Err(IngestError::DuplicateKey(key));
                }
                key
            }
            None => self.repo.unique_citekey(&derive_citekey(&entry)),
        };
        tracing::debug!("Assigned citekey {}", citekey);

        let embedded = extract_docfile(&entry);
        let docfile = match (request.docfile, embedded) {
            (Some(explicit), Some(embedded)) => {
                self.ui.warning(&format!(
                    "Skipping document file from bib file {}, using {} instead.",
                    embedded,
                    explicit.display()
                ));
                Some(explicit)
            }
            (Some(explicit), None) => Some(explicit),
            (None, embedded) => embedded.map(|path| expand_tilde(&PathBuf::from(path))),
        };
        if let Some(docfile) = docfile.as_ref().filter(|path| !path.is_file()) {
            return Err(IngestError::MissingDocument(docfile.clone()));
        }

        let mut paper = Paper::new(citekey, entry);
        if let Some(tags) = request.tags.as_deref() {
            paper.tags = parse_tags(tags);
        }

        self.repo.push_paper(&paper)?;
        self.ui.message(&format!(
            "added to bibshelf:\n{}",
            paper_oneliner(&paper, None, self.color)
        ));

        if let Some(docfile) = docfile {
            let mode = request.doc_mode.unwrap_or(self.default_mode);
            let docpath = self.repo.push_doc(&paper.citekey, &docfile, mode)?;
            paper.docpath = Some(docpath);

            let verb = match mode {
                DocAddMode::Copy => "copied",
                DocAddMode::Move => "moved",
                DocAddMode::Link => "linked",
            };
            self.ui.message(&format!(
                "{} was {} to the bibshelf repository.",
                docfile.display(),
                verb
            ));
        }

        Ok(AddOutcome::Added(paper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::ADD_TEMPLATE;
    use crate::models::BibEntry;
    use crate::repository::MemoryRepository;
    use crate::sources::MockResolver;
    use crate::ui::RecordingUi;
    use std::path::Path;
    use std::sync::Arc;

    const DOI_RECORD: &str =
        "@article{Doe_2020, author = {Doe, Jane and Roe, Rick}, title = {On Things}, year = {2020}}";

    fn resolvers() -> ResolverRegistry {
        let mut registry = ResolverRegistry::empty();
        registry.register(Arc::new(
            MockResolver::new(IdentifierKind::Doi).with_record("10.1/x", DOI_RECORD),
        ));
        registry
    }

    fn add(
        repo: &mut MemoryRepository,
        ui: &mut RecordingUi,
        request: AddRequest,
    ) -> Result<AddOutcome, IngestError> {
        let registry = resolvers();
        Ingestor::new(repo, &registry, ui, DocAddMode::Copy).add(request)
    }

    fn existing(citekey: &str) -> Paper {
        Paper::new(citekey, BibEntry::new("misc").with_field("title", "Old"))
    }

    fn document(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    fn bibfile(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("entry.bib");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_add_from_doi() {
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::Doi("10.1/x".to_string()));
        request.tags = Some("ml, vision,,ml".to_string());
        let outcome = add(&mut repo, &mut ui, request).unwrap();

        let AddOutcome::Added(paper) = outcome else {
            panic!("paper not added");
        };
        assert_eq!(paper.citekey, "Doe_2020");
        assert_eq!(paper.tags.iter().collect::<Vec<_>>(), vec!["ml", "vision"]);
        assert_eq!(repo.papers().len(), 1);
        assert!(ui.messages[0].starts_with("added to bibshelf:\n[Doe_2020]"));
    }

    #[test]
    fn test_derived_key_is_made_unique() {
        let mut repo = MemoryRepository::with_papers(vec![existing("Doe_2020")]);
        let mut ui = RecordingUi::new();

        let outcome = add(&mut repo, &mut ui, AddRequest::new(BibSource::Doi("10.1/x".into()))).unwrap();

        assert!(matches!(outcome, AddOutcome::Added(p) if p.citekey == "Doe_2020a"));
        assert_eq!(repo.papers().len(), 2);
    }

    #[test]
    fn test_explicit_duplicate_key_is_rejected() {
        let mut repo = MemoryRepository::with_papers(vec![existing("taken")]);
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::Doi("10.1/x".to_string()));
        request.citekey = Some("taken".to_string());
        let err = add(&mut repo, &mut ui, request).unwrap_err();

        assert!(matches!(err, IngestError::DuplicateKey(ref key) if key == "taken"));
        assert_eq!(repo.papers().len(), 1);
        assert!(!repo.calls().contains(&"push_paper".to_string()));
    }

    #[test]
    fn test_explicit_key_with_illegal_characters() {
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::Doi("10.1/x".to_string()));
        request.citekey = Some("has space".to_string());

        assert!(matches!(
            add(&mut repo, &mut ui, request),
            Err(IngestError::InvalidCitekey(_))
        ));
        assert!(repo.papers().is_empty());
    }

    #[test]
    fn test_explicit_docfile_wins_over_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = bibfile(
            dir.path(),
            "@article{k, title = {T}, file = {Full Text:/papers/embedded.pdf:PDF}}",
        );
        let explicit = document(dir.path(), "explicit.pdf");
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::File(path));
        request.docfile = Some(explicit.clone());
        add(&mut repo, &mut ui, request).unwrap();

        assert_eq!(
            ui.warnings,
            vec![format!(
                "Skipping document file from bib file /papers/embedded.pdf, using {} instead.",
                explicit.display()
            )]
        );
        assert_eq!(repo.docs()[0].1, explicit);
    }

    #[test]
    fn test_embedded_docfile_used_when_no_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document(dir.path(), "a.pdf");
        let path = bibfile(
            dir.path(),
            &format!("@article{{k, title = {{T}}, pdf = {{{}}}}}", doc.display()),
        );
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        add(&mut repo, &mut ui, AddRequest::new(BibSource::File(path))).unwrap();

        assert!(ui.warnings.is_empty());
        assert_eq!(repo.docs()[0].1, doc);
        assert_eq!(repo.docs()[0].2, DocAddMode::Copy);
        assert_eq!(
            ui.messages[1],
            format!("{} was copied to the bibshelf repository.", doc.display())
        );
    }

    #[test]
    fn test_explicit_doc_mode_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = bibfile(dir.path(), "@article{k, title = {T}}");
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::File(path));
        request.docfile = Some(document(dir.path(), "a.pdf"));
        request.doc_mode = Some(DocAddMode::Link);
        add(&mut repo, &mut ui, request).unwrap();

        assert_eq!(repo.docs()[0].2, DocAddMode::Link);
        assert!(ui.messages[1].ends_with("was linked to the bibshelf repository."));
    }

    #[test]
    fn test_missing_docfile_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::Doi("10.1/x".to_string()));
        request.docfile = Some(dir.path().join("absent.pdf"));
        let err = add(&mut repo, &mut ui, request).unwrap_err();

        assert!(matches!(err, IngestError::MissingDocument(ref p) if p.ends_with("absent.pdf")));
        assert_eq!(repo.calls(), vec!["contains"]);
        assert!(repo.papers().is_empty());
        assert!(ui.messages.is_empty());
    }

    #[test]
    fn test_document_checked_then_paper_then_doc_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let mut request = AddRequest::new(BibSource::Doi("10.1/x".to_string()));
        request.docfile = Some(document(dir.path(), "paper.pdf"));
        add(&mut repo, &mut ui, request).unwrap();

        assert_eq!(repo.calls(), vec!["contains", "push_paper", "push_doc"]);
    }

    #[test]
    fn test_no_document() {
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        add(&mut repo, &mut ui, AddRequest::new(BibSource::Doi("10.1/x".into()))).unwrap();

        assert!(repo.docs().is_empty());
        assert_eq!(ui.messages.len(), 1);
    }

    #[test]
    fn test_unedited_template_abort_leaves_repository_untouched() {
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new().edit(ADD_TEMPLATE).answer(false);

        let outcome = add(&mut repo, &mut ui, AddRequest::new(BibSource::Editor)).unwrap();

        assert_eq!(outcome, AddOutcome::Aborted(AbortReason::Unedited));
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_reference_not_found_stops_ingestion() {
        let mut repo = MemoryRepository::new();
        let mut ui = RecordingUi::new();

        let err = add(&mut repo, &mut ui, AddRequest::new(BibSource::Doi("10.1/nope".into())))
            .unwrap_err();

        assert!(matches!(err, IngestError::ReferenceNotFound { kind: IdentifierKind::Doi, .. }));
        assert!(repo.calls().is_empty());
    }
}
