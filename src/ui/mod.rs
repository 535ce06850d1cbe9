//! Terminal interaction: messages, prompts and editor sessions.
//!
//! The ingestion pipeline talks to the user only through the [`Ui`] trait.
//! [`TerminalUi`] is the interactive implementation; [`RecordingUi`] plays
//! back scripted answers and captures output for tests.

pub mod mock;
pub mod pretty;

pub use mock::RecordingUi;

use owo_colors::OwoColorize;
use std::io::{BufRead, IsTerminal, Write};
use std::process::Command;

/// User-facing side of the application
pub trait Ui {
    /// Print an informational message on stdout
    fn message(&mut self, text: &str);

    /// Print a warning on stderr
    fn warning(&mut self, text: &str);

    /// Print an error on stderr
    fn error(&mut self, text: &str);

    /// Ask a yes/no question; an empty answer takes the default
    fn input_yn(&mut self, question: &str, default: bool) -> Result<bool, UiError>;

    /// Open `initial` in the user's editor and return the saved text
    fn editor_input(&mut self, initial: &str, suffix: &str) -> Result<String, UiError>;
}

/// UI errors
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Editor failed: {0}")]
    Editor(String),
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Interactive terminal UI
#[derive(Debug, Clone)]
pub struct TerminalUi {
    editor: String,
    color_out: bool,
    color_err: bool,
}

impl TerminalUi {
    /// Create a UI launching `editor` for editor sessions
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
            color_out: is_terminal(),
            color_err: std::io::stderr().is_terminal(),
        }
    }

    /// Whether stdout output is styled
    pub fn color(&self) -> bool {
        self.color_out
    }

    fn ask(&self, question: &str, default: bool) -> Result<Option<bool>, UiError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        if self.color_out {
            print!("{} {} ", question.bold(), hint.dimmed());
        } else {
            print!("{} {} ", question, hint);
        }
        std::io::stdout().flush()?;

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(Some(default));
        }
        Ok(match answer.trim().to_lowercase().as_str() {
            "" => Some(default),
            "y" | "yes" => Some(true),
            "n" | "no" => Some(false),
            _ => None,
        })
    }
}

impl Ui for TerminalUi {
    fn message(&mut self, text: &str) {
        println!("{}", text);
    }

    fn warning(&mut self, text: &str) {
        if self.color_err {
            eprintln!("{} {}", "warning:".yellow().bold(), text);
        } else {
            eprintln!("warning: {}", text);
        }
    }

    fn error(&mut self, text: &str) {
        if self.color_err {
            eprintln!("{} {}", "error:".red().bold(), text);
        } else {
            eprintln!("error: {}", text);
        }
    }

    fn input_yn(&mut self, question: &str, default: bool) -> Result<bool, UiError> {
        loop {
            if let Some(answer) = self.ask(question, default)? {
                return Ok(answer);
            }
            println!("Please answer y or n.");
        }
    }

    fn editor_input(&mut self, initial: &str, suffix: &str) -> Result<String, UiError> {
        let file = tempfile::Builder::new()
            .prefix("bibshelf-")
            .suffix(suffix)
            .tempfile()?;
        std::fs::write(file.path(), initial)?;

        let mut parts = self.editor.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| UiError::Editor("no editor configured".to_string()))?;

        tracing::debug!("Launching editor {} on {}", self.editor, file.path().display());
        let status = Command::new(program)
            .args(parts)
            .arg(file.path())
            .status()
            .map_err(|e| UiError::Editor(format!("{}: {}", program, e)))?;

        if !status.success() {
            return Err(UiError::Editor(format!("{} exited with {}", program, status)));
        }

        Ok(std::fs::read_to_string(file.path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_input_runs_command() {
        // `true` leaves the file as written
        let mut ui = TerminalUi::new("true");
        let text = ui.editor_input("@misc{k, title={T}}", ".bib").unwrap();
        assert_eq!(text, "@misc{k, title={T}}");
    }

    #[test]
    fn test_editor_failure_is_error() {
        let mut ui = TerminalUi::new("false");
        assert!(matches!(
            ui.editor_input("x", ".bib"),
            Err(UiError::Editor(_))
        ));
    }

    #[test]
    fn test_missing_editor_is_error() {
        let mut ui = TerminalUi::new("   ");
        assert!(matches!(
            ui.editor_input("x", ".bib"),
            Err(UiError::Editor(_))
        ));
    }
}
