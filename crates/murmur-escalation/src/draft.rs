// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use murmur_core::{Layer, MurmurError};

/// Longest knowledge title, in characters.
const TITLE_MAX_CHARS: usize = 80;

/// The owner's answer to an escalation, before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDraft {
    pub text: String,
    /// Visibility of the published answer; the configured default when `None`.
    pub layer: Option<Layer>,
}

impl AnswerDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            layer: None,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Returns the trimmed answer, or a validation error if nothing is left.
    pub fn validate(&self) -> Result<&str, MurmurError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(MurmurError::Validation(
                "answer text must not be empty".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Title of the knowledge artifact created from an answered question.
pub(crate) fn knowledge_title(question: &str) -> String {
    let question = question.split_whitespace().collect::<Vec<_>>().join(" ");
    if question.chars().count() <= TITLE_MAX_CHARS {
        return question;
    }
    let cut: String = question.chars().take(TITLE_MAX_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}
