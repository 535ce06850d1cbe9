//! Core data models for bibliographic entries and stored papers.

mod entry;
mod paper;

pub use entry::{last_name, BibEntry};
pub use paper::{parse_tags, Paper};
