// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anonymization of agent-activity conversations.
//!
//! Agent owners may read the chats other people had with their agent, but
//! not learn who those people are. [`anonymize_activity`] consumes the wire
//! record and keeps only derived display attributes; the visitor's id, name
//! and handle are dropped before the summary exists.

use murmur_core::types::{ConversationRecord, CounterpartRecord, VisitorProfile};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::summary::{ConversationSummary, Counterpart, truncate_preview};

/// Avatar colors for anonymous visitors.
const PALETTE: [&str; 8] = [
    "#e57373", "#64b5f6", "#81c784", "#ffb74d", "#ba68c8", "#4db6ac", "#f06292", "#a1887f",
];

/// Display attributes standing in for a hidden visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousIdentity {
    pub initials: String,
    /// Hex RGB color, stable per visitor.
    pub color: String,
    /// Short label such as `Visitor 3fa2`, stable per visitor.
    pub label: String,
}

impl AnonymousIdentity {
    fn derive(profile: VisitorProfile) -> Self {
        let digest = Sha256::digest(profile.id.as_bytes());
        let color = PALETTE[usize::from(digest[0]) % PALETTE.len()].to_string();
        let label = format!("Visitor {}", &hex::encode(&digest[1..3]));
        Self {
            initials: initials(&profile.display_name),
            color,
            label,
        }
    }
}

fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// Turns an agent-activity record into a summary with the visitor's identity removed.
pub fn anonymize_activity(record: ConversationRecord, preview_chars: usize) -> ConversationSummary {
    let counterpart = match record.counterpart {
        CounterpartRecord::Visitor(profile) => {
            Counterpart::Anonymous(AnonymousIdentity::derive(profile))
        }
        CounterpartRecord::Agent(persona) => Counterpart::from_persona(persona),
    };
    ConversationSummary {
        id: record.id,
        category: record.category,
        counterpart,
        last_message_at: record.last_message_at,
        preview: record
            .last_message_preview
            .map(|p| truncate_preview(&p, preview_chars)),
        unread_count: record.unread_count,
        escalation: None,
    }
}
