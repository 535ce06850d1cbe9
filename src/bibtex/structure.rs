//! Entry structure helpers: validation, citekey derivation, embedded documents.

use crate::models::{last_name, BibEntry};

use super::DecodeError;

/// Characters that may not appear in a citekey
const FORBIDDEN_CITEKEY_CHARS: &[char] = &['\'', '"', ',', '#', '{', '}', '~', '%', '/', '\\', '@', '='];

/// Template shown when a paper is added interactively
pub const ADD_TEMPLATE: &str = r#"% Input the bibliographic data for your paper in BibTeX format.
% Lines outside the entry are ignored. Save and quit the editor when done.

@article{YourCitekey,
  author = {LastName1, FirstName1 and LastName2, FirstName2},
  title = {},
  journal = {},
  volume = {},
  number = {},
  pages = {},
  year = {},
  doi = {},
  keywords = {},
  abstract = {}
}
"#;

/// Check that a decoded entry is usable downstream
pub fn validate(entry: &BibEntry) -> Result<(), DecodeError> {
    if entry.entry_type.is_empty() {
        return Err(DecodeError::Invalid("missing entry type".to_string()));
    }

    match entry.title() {
        Some(title) if !title.trim().is_empty() => Ok(()),
        _ => Err(DecodeError::Invalid("missing or empty title".to_string())),
    }
}

/// Whether a string can be used as a citekey as-is
pub fn is_valid_citekey(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CITEKEY_CHARS.contains(&c))
}

/// Drop every character that is not allowed in a citekey
pub fn sanitize_citekey(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control() && !FORBIDDEN_CITEKEY_CHARS.contains(c))
        .collect()
}

/// Derive a base citekey from the entry's structure.
///
/// Preference order: the key written in the source, the first author's (or
/// editor's) last name followed by the year, the first word of the title
/// followed by the year. The result is not guaranteed unique.
pub fn derive_citekey(entry: &BibEntry) -> String {
    if let Some(key) = entry.key.as_deref().map(sanitize_citekey) {
        if !key.is_empty() {
            return key;
        }
    }

    let year = entry.year().unwrap_or_default();

    let person = entry
        .authors
        .first()
        .map(String::as_str)
        .or_else(|| entry.get("editor").and_then(|e| e.split(" and ").next()));
    if let Some(person) = person {
        let key = sanitize_citekey(&format!("{}{}", last_name(person), year));
        if !key.is_empty() {
            return key;
        }
    }

    let word = entry
        .title()
        .and_then(|t| t.split_whitespace().next())
        .unwrap_or_default();
    let key = sanitize_citekey(&format!("{}{}", word, year));
    if key.is_empty() {
        "paper".to_string()
    } else {
        key
    }
}

/// Document path embedded in the entry, if any.
///
/// Looks at `file` first (plain path, or JabRef/Mendeley
/// `description:path:type` triples separated by `;`), then `attachments`,
/// then `pdf`.
pub fn extract_docfile(entry: &BibEntry) -> Option<String> {
    if let Some(field) = entry.get("file") {
        let first = field.split(';').next().unwrap_or(field);
        let parts: Vec<&str> = first.split(':').collect();
        let path = if parts.len() >= 3 {
            parts[1..parts.len() - 1].join(":")
        } else {
            first.to_string()
        };
        let path = path.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    ["attachments", "pdf"]
        .iter()
        .filter_map(|name| entry.get(name))
        .map(str::trim)
        .find(|p| !p.is_empty())
        .map(str::to_string)
}
