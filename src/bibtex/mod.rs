//! BibTeX decoding and encoding.
//!
//! The decoder covers the subset of BibTeX that hand-written files and
//! DOI/ISBN/arXiv services produce: one entry per input, brace or quote
//! delimited values, `#` concatenation, `@string` macros, and `@comment` /
//! `@preamble` blocks (skipped). Text outside `@` blocks is ignored, which is
//! also how BibTeX treats it.
//!
//! [`decode`] both parses and validates; any failure is a [`DecodeError`].

mod structure;

pub use structure::{
    derive_citekey, extract_docfile, is_valid_citekey, sanitize_citekey, validate, ADD_TEMPLATE,
};

use std::collections::HashMap;

use crate::models::BibEntry;

/// Errors produced while decoding BibTeX text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The text is not well-formed BibTeX
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// The text parsed but the entry is not usable
    #[error("invalid entry: {0}")]
    Invalid(String),
}

/// Decode exactly one validated entry from BibTeX text
pub fn decode(raw: &str) -> Result<BibEntry, DecodeError> {
    let mut parser = Parser::new(raw);
    let mut entries = parser.parse()?;

    let entry = match entries.len() {
        0 => return Err(DecodeError::Invalid("no entry found".to_string())),
        1 => entries.remove(0),
        n => {
            return Err(DecodeError::Invalid(format!(
                "expected exactly one entry, found {}",
                n
            )))
        }
    };

    validate(&entry)?;
    Ok(entry)
}

/// Encode an entry as BibTeX text
pub fn encode(entry: &BibEntry) -> String {
    let mut out = format!("@{}{{{},\n", entry.entry_type, entry.key.as_deref().unwrap_or(""));
    if entry.has_authors() {
        let names: Vec<String> = entry.authors.iter().map(|name| encode_name(name)).collect();
        out.push_str(&format!("  author = {{{}}},\n", names.join(" and ")));
    }
    for (name, value) in &entry.fields {
        out.push_str(&format!("  {} = {{{}}},\n", name, value));
    }
    out.push_str("}\n");
    out
}

/// Brace a name that would otherwise split on its own `and`
fn encode_name(name: &str) -> String {
    if name.split_whitespace().any(|word| word.eq_ignore_ascii_case("and")) {
        format!("{{{}}}", name)
    } else {
        name.to_string()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    macros: HashMap<String, String>,
}

impl Parser {
    fn new(raw: &str) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            macros: HashMap::new(),
        }
    }

    fn parse(&mut self) -> Result<Vec<BibEntry>, DecodeError> {
        let mut entries = Vec::new();

        while self.seek_block() {
            self.pos += 1; // '@'
            let kind = self.identifier()?.to_lowercase();
            self.skip_ws();
            let close = match self.bump() {
                Some('{') => '}',
                Some('(') => ')',
                _ => return Err(self.error(format!("expected '{{' after @{}", kind))),
            };

            match kind.as_str() {
                "comment" => self.skip_balanced(close)?,
                "preamble" => {
                    self.value()?;
                    self.expect_close(close)?;
                }
                "string" => {
                    self.skip_ws();
                    let name = self.identifier()?.to_lowercase();
                    self.skip_ws();
                    self.expect('=')?;
                    let value = self.value()?;
                    self.macros.insert(name, value);
                    self.expect_close(close)?;
                }
                _ => entries.push(self.entry(kind, close)?),
            }
        }

        Ok(entries)
    }

    fn entry(&mut self, entry_type: String, close: char) -> Result<BibEntry, DecodeError> {
        let mut entry = BibEntry::new(entry_type);

        self.skip_ws();
        let key: String = self.take_while(|c| c != ',' && c != close && !c.is_whitespace());
        if !key.is_empty() {
            entry.key = Some(key);
        }

        loop {
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(entry),
                Some(c) => return Err(self.error(format!("unexpected '{}' in entry", c))),
                None => return Err(self.error("unterminated entry".to_string())),
            }

            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(entry);
            }

            let name = self.identifier()?.to_lowercase();
            self.skip_ws();
            self.expect('=')?;
            let raw = self.value()?;

            if name == "author" {
                if entry.has_authors() {
                    return Err(self.error("duplicate field 'author'".to_string()));
                }
                entry.authors = split_names(&raw);
            } else {
                if entry.fields.contains_key(&name) {
                    return Err(self.error(format!("duplicate field '{}'", name)));
                }
                entry.set(&name, clean_value(&raw));
            }
        }
    }

    /// One field value: pieces joined by `#`. Inner braces are kept.
    fn value(&mut self) -> Result<String, DecodeError> {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('{') => {
                    self.pos += 1;
                    value.push_str(&self.delimited('}')?);
                }
                Some('"') => {
                    self.pos += 1;
                    value.push_str(&self.delimited('"')?);
                }
                Some(c) if c.is_ascii_digit() => {
                    value.push_str(&self.take_while(|c| c.is_ascii_digit()));
                }
                Some(c) if is_ident_char(c) => {
                    let name = self.identifier()?;
                    match self.macros.get(&name.to_lowercase()) {
                        Some(expansion) => value.push_str(expansion),
                        None => value.push_str(&name),
                    }
                }
                _ => return Err(self.error("expected a field value".to_string())),
            }

            self.skip_ws();
            if self.peek() == Some('#') {
                self.pos += 1;
            } else {
                return Ok(value);
            }
        }
    }

    /// Read up to the matching terminator at brace depth zero
    fn delimited(&mut self, end: char) -> Result<String, DecodeError> {
        let mut depth = 0usize;
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                    continue;
                }
                c if c == end && depth == 0 => return Ok(out),
                '{' => depth += 1,
                '}' => {
                    if depth == 0 {
                        return Err(self.error("unbalanced '}' in value".to_string()));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            out.push(c);
        }
        Err(self.error("unterminated value".to_string()))
    }

    fn skip_balanced(&mut self, close: char) -> Result<(), DecodeError> {
        let open = if close == '}' { '{' } else { '(' };
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            if c == open {
                depth += 1;
            } else if c == close {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
        }
        Err(self.error("unterminated @comment".to_string()))
    }

    fn expect_close(&mut self, close: char) -> Result<(), DecodeError> {
        self.skip_ws();
        self.expect(close)
    }

    fn expect(&mut self, expected: char) -> Result<(), DecodeError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn identifier(&mut self) -> Result<String, DecodeError> {
        let ident = self.take_while(is_ident_char);
        if ident.is_empty() {
            return Err(self.error("expected an identifier".to_string()));
        }
        Ok(ident)
    }

    /// Advance to the next `@`; false at end of input
    fn seek_block(&mut self) -> bool {
        while let Some(c) = self.peek() {
            if c == '@' {
                return true;
            }
            self.pos += 1;
        }
        false
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: String) -> DecodeError {
        let end = self.pos.min(self.chars.len());
        let line = self.chars[..end].iter().filter(|&&c| c == '\n').count() + 1;
        DecodeError::Syntax { line, message }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '+' | '/')
}

/// Strip grouping braces and collapse whitespace
fn clean_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            out.push(c);
            escaped = true;
        } else if c != '{' && c != '}' {
            out.push(c);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a name list on `and` at brace depth zero
fn split_names(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0i32;

    for word in raw.split_whitespace() {
        if depth == 0 && word.eq_ignore_ascii_case("and") {
            names.push(current.join(" "));
            current.clear();
            continue;
        }
        depth += word.matches('{').count() as i32 - word.matches('}').count() as i32;
        current.push(word);
    }
    names.push(current.join(" "));

    names
        .iter()
        .map(|n| clean_value(n))
        .filter(|n| !n.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"
% exported from somewhere
@string{ jmlr = "Journal of Machine Learning Research" }

@Article{Doe2019,
  Author = {Doe, Jane and {Barnes and Noble} and John Smith},
  title  = {The {Deep} Structure
            of Things},
  journal = jmlr,
  year = 2019,
  month = jan,
  note = "part " # {one},
}
"#;

    #[test]
    fn test_decode_article() {
        let entry = decode(ARTICLE).unwrap();

        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.key.as_deref(), Some("Doe2019"));
        assert_eq!(entry.authors, vec!["Doe, Jane", "Barnes and Noble", "John Smith"]);
        assert_eq!(entry.title(), Some("The Deep Structure of Things"));
        assert_eq!(entry.get("journal"), Some("Journal of Machine Learning Research"));
        assert_eq!(entry.year(), Some("2019"));
        assert_eq!(entry.get("month"), Some("jan"));
        assert_eq!(entry.get("note"), Some("part one"));
    }

    #[test]
    fn test_decode_skips_comment_and_preamble() {
        let raw = r#"@comment{ anything {nested} here }
@preamble{ "\newcommand{\x}{y}" }
@book(key1, title = "A Book")"#;

        let entry = decode(raw).unwrap();
        assert_eq!(entry.entry_type, "book");
        assert_eq!(entry.key.as_deref(), Some("key1"));
        assert_eq!(entry.title(), Some("A Book"));
    }

    #[test]
    fn test_decode_rejects_multiple_entries() {
        let raw = "@misc{a, title={A}}\n@misc{b, title={B}}";
        assert_eq!(
            decode(raw),
            Err(DecodeError::Invalid("expected exactly one entry, found 2".to_string()))
        );
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(decode(""), Err(DecodeError::Invalid(_))));
        assert!(matches!(decode("just words"), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_decode_syntax_error_reports_line() {
        let raw = "@article{k,\n  title = {Open,\n  year = 2000\n";
        match decode(raw) {
            Err(DecodeError::Syntax { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_duplicate_field() {
        let raw = "@misc{k, title={A}, title={B}}";
        assert!(matches!(decode(raw), Err(DecodeError::Syntax { .. })));
    }

    #[test]
    fn test_decode_requires_title() {
        let raw = "@misc{k, author={Doe, J.}}";
        assert!(matches!(decode(raw), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_encode_then_decode_preserves_entry() {
        let entry = BibEntry::new("book")
            .with_key("Knuth1984")
            .with_author("Knuth, Donald E.")
            .with_field("title", "The TeXbook")
            .with_field("year", "1984");

        assert_eq!(decode(&encode(&entry)).unwrap(), entry);
    }

    #[test]
    fn test_encode_keeps_corporate_author_whole() {
        let entry = BibEntry::new("book")
            .with_author("Barnes and Noble")
            .with_author("Doe, Jane")
            .with_field("title", "Catalogue");

        let raw = encode(&entry);
        assert!(raw.contains("author = {{Barnes and Noble} and Doe, Jane}"));
        assert_eq!(decode(&raw).unwrap().authors, vec!["Barnes and Noble", "Doe, Jane"]);
    }
}
