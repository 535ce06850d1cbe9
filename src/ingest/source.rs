//! Source reconciliation: one input source to one validated entry.

use std::path::{Path, PathBuf};

use super::IngestError;
use crate::bibtex::{self, ADD_TEMPLATE};
use crate::models::BibEntry;
use crate::sources::{IdentifierKind, ResolverRegistry};
use crate::ui::Ui;

/// Where the bibliographic data of a new paper comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BibSource {
    File(PathBuf),
    Doi(String),
    Isbn(String),
    Arxiv(String),
    /// Interactive editor session
    Editor,
}

impl BibSource {
    /// Pick one source by priority: file, DOI, ISBN, arXiv, then the editor
    pub fn select(
        bibfile: Option<PathBuf>,
        doi: Option<String>,
        isbn: Option<String>,
        arxiv: Option<String>,
    ) -> Self {
        if let Some(path) = bibfile {
            BibSource::File(path)
        } else if let Some(doi) = doi {
            BibSource::Doi(doi)
        } else if let Some(isbn) = isbn {
            BibSource::Isbn(isbn)
        } else if let Some(arxiv) = arxiv {
            BibSource::Arxiv(arxiv)
        } else {
            BibSource::Editor
        }
    }
}

/// Why an interactive session ended without an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The template was left untouched
    Unedited,
    /// The draft did not decode
    Invalid,
}

impl AbortReason {
    /// Process exit status for this abort
    pub fn exit_code(&self) -> u8 {
        match self {
            AbortReason::Unedited => 0,
            AbortReason::Invalid => 1,
        }
    }
}

/// Result of reconciling a source
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Entry(BibEntry),
    Aborted(AbortReason),
}

/// Produce one validated entry from the selected source
pub fn reconcile(
    source: &BibSource,
    resolvers: &ResolverRegistry,
    ui: &mut dyn Ui,
) -> Result<Reconciled, IngestError> {
    match source {
        BibSource::File(path) => from_file(path).map(Reconciled::Entry),
        BibSource::Doi(id) => {
            from_identifier(IdentifierKind::Doi, id, resolvers).map(Reconciled::Entry)
        }
        BibSource::Isbn(id) => {
            from_identifier(IdentifierKind::Isbn, id, resolvers).map(Reconciled::Entry)
        }
        BibSource::Arxiv(id) => {
            from_identifier(IdentifierKind::Arxiv, id, resolvers).map(Reconciled::Entry)
        }
        BibSource::Editor => from_editor(ui),
    }
}

fn from_file(path: &Path) -> Result<BibEntry, IngestError> {
    let raw = std::fs::read_to_string(path).map_err(|error| IngestError::Io {
        path: path.to_path_buf(),
        error,
    })?;

    bibtex::decode(&raw).map_err(|error| IngestError::InvalidBibData {
        path: path.to_path_buf(),
        error,
    })
}

fn from_identifier(
    kind: IdentifierKind,
    id: &str,
    resolvers: &ResolverRegistry,
) -> Result<BibEntry, IngestError> {
    let not_found = |reason: String| IngestError::ReferenceNotFound {
        kind,
        id: id.to_string(),
        reason,
    };

    let resolver = resolvers
        .get_required(kind)
        .map_err(|e| not_found(e.to_string()))?;
    let normalized = resolver
        .normalize_id(id)
        .map_err(|e| not_found(e.to_string()))?;

    tracing::info!("Looking up {} {} via {}", kind, normalized, resolver.name());
    let raw = resolver
        .fetch_bibtex(&normalized)
        .map_err(|e| not_found(e.to_string()))?;

    if raw.trim().is_empty() {
        return Err(not_found("empty response".to_string()));
    }
    bibtex::decode(&raw).map_err(|e| not_found(e.to_string()))
}

fn from_editor(ui: &mut dyn Ui) -> Result<Reconciled, IngestError> {
    let mut draft = ADD_TEMPLATE.to_string();

    loop {
        draft = ui.editor_input(&draft, ".bib")?;

        if draft == ADD_TEMPLATE {
            if !ui.input_yn("Bibfile not edited. Edit again?", true)? {
                return Ok(Reconciled::Aborted(AbortReason::Unedited));
            }
            continue;
        }

        match bibtex::decode(&draft) {
            Ok(entry) => return Ok(Reconciled::Entry(entry)),
            Err(e) => {
                ui.error(&format!("Invalid bibfile: {}", e));
                if !ui.input_yn("Invalid bibfile. Edit again?", true)? {
                    return Ok(Reconciled::Aborted(AbortReason::Invalid));
                }
            }
        }
    }
}
