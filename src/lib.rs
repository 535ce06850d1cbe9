//! # bibshelf
//!
//! A personal bibliography manager. Papers are ingested from a BibTeX file,
//! an editor session, or a DOI / ISBN / arXiv lookup, stored under a unique
//! citekey together with an optional document, and retrieved with a small
//! `field:value` query language.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (BibEntry, Paper)
//! - [`bibtex`]: BibTeX decoding, encoding and citekey helpers
//! - [`query`]: Field-addressed query parsing, matching and ordering
//! - [`ingest`]: Source reconciliation and the add pipeline
//! - [`sources`]: Identifier resolvers (DOI, ISBN, arXiv)
//! - [`repository`]: Paper and document storage
//! - [`ui`]: Terminal presentation and prompts
//! - [`utils`]: HTTP client, retry, identifier validation
//! - [`config`]: Configuration management

pub mod bibtex;
pub mod config;
pub mod ingest;
pub mod models;
pub mod query;
pub mod repository;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{BibEntry, Paper};
pub use repository::{FileRepository, Repository};
pub use sources::{Resolver, ResolverRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
