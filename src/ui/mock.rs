//! Scripted UI for testing purposes.

use std::collections::VecDeque;

use super::{Ui, UiError};

/// A UI that answers from a script and records everything shown to the user
#[derive(Debug, Default)]
pub struct RecordingUi {
    answers: VecDeque<bool>,
    edits: VecDeque<String>,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Questions asked via `input_yn`, in order
    pub questions: Vec<String>,
    /// Text handed to the editor, in order
    pub editor_inputs: Vec<String>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next yes/no question
    pub fn answer(mut self, yes: bool) -> Self {
        self.answers.push_back(yes);
        self
    }

    /// Queue the text the next editor session returns
    pub fn edit(mut self, text: impl Into<String>) -> Self {
        self.edits.push_back(text.into());
        self
    }
}

impl Ui for RecordingUi {
    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn warning(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }

    fn input_yn(&mut self, question: &str, default: bool) -> Result<bool, UiError> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(default))
    }

    fn editor_input(&mut self, initial: &str, _suffix: &str) -> Result<String, UiError> {
        self.editor_inputs.push(initial.to_string());
        self.edits
            .pop_front()
            .ok_or_else(|| UiError::Editor("no scripted editor session left".to_string()))
    }
}
