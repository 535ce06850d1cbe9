//! Input validation for identifiers and filenames.
//!
//! Identifiers supplied on the command line are normalised here before they
//! reach a resolver; filenames are sanitised before documents are written
//! into the repository.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),

    #[error("Invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("Invalid arXiv ID: {0}")]
    InvalidArxivId(String),

    #[error("Invalid filename: contains disallowed characters")]
    InvalidFilename,

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Validate and standardise a DOI
///
/// DOIs have the format "10.xxxx/xxxxxx" where xxxx is a registrant code
/// and xxxxxx is an item ID. `doi:` and `doi.org` URL prefixes are removed.
pub fn validate_doi(doi: &str) -> Result<String, ValidationError> {
    let doi = doi.trim().to_lowercase();

    if doi.is_empty() {
        return Err(ValidationError::InvalidDoi("empty DOI".to_string()));
    }

    let doi = doi.strip_prefix("doi:").unwrap_or(&doi);
    let doi = ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "http://dx.doi.org/"]
        .iter()
        .find_map(|prefix| doi.strip_prefix(prefix))
        .unwrap_or(doi)
        .trim();

    if !doi.starts_with("10.") {
        return Err(ValidationError::InvalidDoi(
            "DOI must start with '10.'".to_string(),
        ));
    }

    if !doi.contains('/') {
        return Err(ValidationError::InvalidDoi(
            "DOI must contain a slash".to_string(),
        ));
    }

    if doi.contains("..") {
        return Err(ValidationError::InvalidDoi(
            "path traversal detected".to_string(),
        ));
    }

    Ok(doi.to_string())
}

/// Validate an ISBN-10 or ISBN-13, returning its bare digits
pub fn validate_isbn(isbn: &str) -> Result<String, ValidationError> {
    let digits: String = isbn
        .trim()
        .trim_start_matches("ISBN")
        .trim_start_matches("isbn")
        .trim_start_matches(':')
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_uppercase();

    if !digits.is_ascii() {
        return Err(ValidationError::InvalidIsbn(isbn.trim().to_string()));
    }

    let well_formed = match digits.len() {
        10 => {
            digits[..9].chars().all(|c| c.is_ascii_digit())
                && digits[9..].chars().all(|c| c.is_ascii_digit() || c == 'X')
        }
        13 => digits.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };

    if well_formed {
        Ok(digits)
    } else {
        Err(ValidationError::InvalidIsbn(isbn.trim().to_string()))
    }
}

fn arxiv_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}\.\d{4,5}|[a-z\-]+(\.[A-Z]{2})?/\d{7})(v\d+)?$")
            .expect("arXiv id pattern is valid")
    })
}

/// Normalise an arXiv identifier
///
/// Handles formats like:
/// - "2301.12345"
/// - "2301.12345v1" (version is kept; it selects a specific revision)
/// - "arxiv:2301.12345"
/// - "https://arxiv.org/abs/2301.12345v1"
/// - "hep-th/9901001"
pub fn normalize_arxiv_id(id: &str) -> Result<String, ValidationError> {
    let trimmed = id.trim();
    let mut rest = trimmed;

    if let Some(pos) = rest.find("/abs/") {
        rest = &rest[pos + 5..];
    } else if let Some(pos) = rest.find("/pdf/") {
        rest = &rest[pos + 5..];
        rest = rest.strip_suffix(".pdf").unwrap_or(rest);
    }

    let rest = rest
        .strip_prefix("arXiv:")
        .or_else(|| rest.strip_prefix("arxiv:"))
        .unwrap_or(rest);

    if arxiv_id_pattern().is_match(rest) {
        Ok(rest.to_string())
    } else {
        Err(ValidationError::InvalidArxivId(trimmed.to_string()))
    }
}

/// Sanitize a filename to prevent path traversal and other attacks
///
/// Removes path separators and dangerous characters, limits length,
/// and ensures the filename is safe to use.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let filename = filename.trim();

    if filename.is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains("..")
        || filename.starts_with('/')
        || filename.starts_with('\\')
        || filename.contains(":/")
        || filename.contains(":\\")
    {
        return Err(ValidationError::PathTraversal(filename.to_string()));
    }

    // Keep only safe characters: alphanumeric, dash, underscore, dot
    let mut sanitized: String = filename
        .chars()
        .filter(|&ch| ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
        .collect();

    const MAX_FILENAME_LENGTH: usize = 255;
    if sanitized.len() > MAX_FILENAME_LENGTH {
        let ext_pos = sanitized.rfind('.').unwrap_or(sanitized.len());
        let ext = sanitized.split_at(ext_pos).1.to_string();
        let mut base_len = MAX_FILENAME_LENGTH.saturating_sub(ext.len()).min(ext_pos);
        while !sanitized.is_char_boundary(base_len) {
            base_len -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..base_len], ext);
    }

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}
