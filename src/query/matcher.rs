//! Per-field matching strategies for a single resolved clause.

use std::borrow::Cow;

use super::ResolvedQuery;
use crate::models::{last_name, Paper};

/// Whether one clause holds for one paper
///
/// `tag` matches a substring of any tag, `author` matches an author's last
/// name exactly, and every other field matches a substring of that field's
/// value. A field the entry does not carry never matches.
pub fn matches(paper: &Paper, query: &ResolvedQuery) -> bool {
    let value = query.value.as_str();
    let cs = query.case_sensitive;

    match query.field.as_str() {
        "tag" => paper.tags.iter().any(|tag| fold(tag, cs).contains(value)),
        "author" => paper
            .bibentry
            .authors
            .iter()
            .any(|person| fold(last_name(person), cs) == value),
        field => paper
            .bibentry
            .get(&field.to_lowercase())
            .is_some_and(|text| fold(text, cs).contains(value)),
    }
}

fn fold(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}
