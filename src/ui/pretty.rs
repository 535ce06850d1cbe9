//! One-line paper summaries.

use owo_colors::OwoColorize;
use unicode_width::UnicodeWidthChar;

use crate::models::Paper;

/// Longest title rendered before truncation
pub const TITLE_WIDTH: usize = 80;

/// Render `[citekey] Authors (year) "Title" venue | tags`
///
/// `number` prefixes the line with its position in the collection.
pub fn paper_oneliner(paper: &Paper, number: Option<usize>, color: bool) -> String {
    let entry = &paper.bibentry;
    let mut parts = Vec::new();

    let key = format!("[{}]", paper.citekey);
    parts.push(if color { key.purple().to_string() } else { key });

    let authors = format_authors(&entry.author_last_names().collect::<Vec<_>>());
    if !authors.is_empty() {
        parts.push(authors);
    }
    if let Some(year) = entry.year() {
        parts.push(format!("({})", year));
    }

    let title = format!(
        "\"{}\"",
        truncate_with_ellipsis(entry.title().unwrap_or_default(), TITLE_WIDTH)
    );
    parts.push(if color { title.bold().to_string() } else { title });

    let venue = ["journal", "booktitle", "publisher", "howpublished"]
        .iter()
        .find_map(|field| entry.get(field));
    if let Some(venue) = venue {
        parts.push(if color { venue.italic().to_string() } else { venue.to_string() });
    }

    let mut line = parts.join(" ");
    if !paper.tags.is_empty() {
        let tags = paper.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        let tags = if color { tags.cyan().to_string() } else { tags };
        line = format!("{} | {}", line, tags);
    }

    match number {
        Some(n) => format!("{}: {}", n, line),
        None => line,
    }
}

/// `Last`, `Last and Last`, or `Last et al.`
pub fn format_authors(last_names: &[&str]) -> String {
    match last_names {
        [] => String::new(),
        [one] => one.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [first, ..] => format!("{} et al.", first),
    }
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated.trim_end())
}
