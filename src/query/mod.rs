//! Field-addressed query language.
//!
//! A query is a list of `field:value` clauses combined with AND:
//!
//! ```text
//! bibshelf list a:smith tag:math year:2019
//! ```
//!
//! Unless the caller pins the case policy, a clause is case-sensitive only
//! when its value contains an uppercase character.

pub mod matcher;

use chrono::{DateTime, Utc};

use crate::models::Paper;

/// Short field names accepted in queries
pub const FIELD_ALIASES: &[(&str, &str)] = &[
    ("a", "author"),
    ("authors", "author"),
    ("t", "title"),
    ("tags", "tag"),
];

/// Map a query field token to its canonical name; unknown tokens pass through
pub fn resolve_field(token: &str) -> &str {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, field)| *field)
        .unwrap_or(token)
}

/// Case policy for a whole query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Per clause: sensitive only if the value has an uppercase character
    #[default]
    Infer,
    Sensitive,
    Insensitive,
}

/// A parsed clause with its case decision applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub field: String,
    /// Lower-cased unless `case_sensitive`
    pub value: String,
    pub case_sensitive: bool,
}

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query ({0})")]
    Malformed(String),
}

/// Parse one `field:value` clause
pub fn parse_clause(raw: &str, case: CaseSensitivity) -> Result<ResolvedQuery, QueryError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [field, value] = parts.as_slice() else {
        return Err(QueryError::Malformed(raw.to_string()));
    };

    let value = value.trim();
    let case_sensitive = match case {
        CaseSensitivity::Infer => value.chars().any(char::is_uppercase),
        CaseSensitivity::Sensitive => true,
        CaseSensitivity::Insensitive => false,
    };

    Ok(ResolvedQuery {
        field: resolve_field(field.trim()).to_string(),
        value: if case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        },
        case_sensitive,
    })
}

/// Whether every clause holds for the paper
pub fn evaluate(paper: &Paper, clauses: &[ResolvedQuery]) -> bool {
    clauses.iter().all(|clause| matcher::matches(paper, clause))
}

/// One query result
#[derive(Debug, Clone, PartialEq)]
pub enum Hit<'a> {
    /// Matching paper with its position in the searched collection
    Paper { index: usize, paper: &'a Paper },
    /// Citekey only
    Citekey(&'a str),
}

/// Filter a collection and order the survivors by `(added, index)`
///
/// Every clause is parsed before any paper is looked at, so a malformed
/// clause yields no partial results. No clauses match every paper.
pub fn run<'a, S: AsRef<str>>(
    papers: &'a [Paper],
    raw_clauses: &[S],
    case: CaseSensitivity,
    key_only: bool,
) -> Result<Vec<Hit<'a>>, QueryError> {
    let clauses = raw_clauses
        .iter()
        .map(|raw| parse_clause(raw.as_ref(), case))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("Running query {:?} over {} papers", clauses, papers.len());

    let mut matched: Vec<(DateTime<Utc>, usize, &Paper)> = papers
        .iter()
        .enumerate()
        .filter(|(_, paper)| evaluate(paper, &clauses))
        .map(|(index, paper)| (paper.added, index, paper))
        .collect();
    matched.sort_by_key(|(added, index, _)| (*added, *index));

    Ok(matched
        .into_iter()
        .map(|(_, index, paper)| {
            if key_only {
                Hit::Citekey(&paper.citekey)
            } else {
                Hit::Paper { index, paper }
            }
        })
        .collect())
}
