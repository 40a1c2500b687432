// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation composer drafts.

use std::collections::HashMap;

use murmur_core::ConversationId;

/// Unsent input, one draft per conversation.
#[derive(Debug, Default, Clone)]
pub struct Composer {
    drafts: HashMap<ConversationId, String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_draft(&mut self, conversation_id: &ConversationId, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.drafts.remove(conversation_id);
        } else {
            self.drafts.insert(conversation_id.clone(), text);
        }
    }

    pub fn draft(&self, conversation_id: &ConversationId) -> &str {
        self.drafts
            .get(conversation_id)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Clears the draft and returns it for sending.
    pub fn take_for_send(&mut self, conversation_id: &ConversationId) -> String {
        self.drafts.remove(conversation_id).unwrap_or_default()
    }

    /// Puts the text of a failed or canceled send back.
    ///
    /// Anything typed since the send is kept after the restored text,
    /// on its own line.
    pub fn restore(&mut self, conversation_id: &ConversationId, text: &str) {
        let restored = match self.drafts.remove(conversation_id) {
            Some(typed) if !typed.is_empty() => format!("{text}\n{typed}"),
            _ => text.to_string(),
        };
        self.set_draft(conversation_id, restored);
    }
}
