// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use murmur_core::{ConversationCategory, ConversationId, EscalationId, EscalationStatus, Role};
use tracing::{debug, warn};

use crate::summary::{ConversationSummary, EntryKey, truncate_preview};

/// Escalation rows split by status.
#[derive(Debug, Default)]
pub struct EscalationPartition<'a> {
    pub pending: Vec<&'a ConversationSummary>,
    pub answered: Vec<&'a ConversationSummary>,
    pub declined: Vec<&'a ConversationSummary>,
}

/// The three category lists plus focus and hidden state.
///
/// A row lives in exactly one list. Lists are ordered newest first.
#[derive(Debug)]
pub struct Directory {
    lists: HashMap<ConversationCategory, Vec<ConversationSummary>>,
    hidden: HashSet<ConversationId>,
    focused: Option<ConversationId>,
    preview_chars: usize,
}

impl Directory {
    pub fn new(preview_chars: usize) -> Self {
        Self {
            lists: HashMap::new(),
            hidden: HashSet::new(),
            focused: None,
            preview_chars,
        }
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    /// Replaces one category's list wholesale, typically after a refresh.
    ///
    /// Rows whose category does not match are dropped. Rows that were in
    /// another list move here.
    pub fn replace_category(
        &mut self,
        category: ConversationCategory,
        summaries: Vec<ConversationSummary>,
    ) {
        let (mut rows, stray): (Vec<_>, Vec<_>) = summaries
            .into_iter()
            .partition(|s| s.category == category);
        if !stray.is_empty() {
            warn!(%category, dropped = stray.len(), "rows with a different category ignored");
        }

        let keys: HashSet<EntryKey> = rows.iter().map(ConversationSummary::key).collect();
        for (other, list) in &mut self.lists {
            if *other != category {
                list.retain(|s| !keys.contains(&s.key()));
            }
        }
        if let Some(focused) = &self.focused {
            for row in rows.iter_mut().filter(|s| &s.id == focused) {
                row.unread_count = 0;
            }
        }
        sort_newest_first(&mut rows);
        debug!(%category, count = rows.len(), "directory list replaced");
        self.lists.insert(category, rows);
    }

    /// Inserts or replaces one row.
    pub fn upsert(&mut self, summary: ConversationSummary) {
        let key = summary.key();
        for list in self.lists.values_mut() {
            list.retain(|s| s.key() != key);
        }
        let list = self.lists.entry(summary.category).or_default();
        list.push(summary);
        sort_newest_first(list);
    }

    /// Hides a conversation from listings and search. The client never deletes.
    pub fn hide(&mut self, id: &ConversationId) {
        self.hidden.insert(id.clone());
        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }
    }

    /// Visible rows of one category.
    pub fn list(&self, category: ConversationCategory) -> Vec<&ConversationSummary> {
        self.lists
            .get(&category)
            .into_iter()
            .flatten()
            .filter(|s| !self.hidden.contains(&s.id))
            .collect()
    }

    /// Case-insensitive substring search over name, handle and preview.
    pub fn search(&self, category: ConversationCategory, query: &str) -> Vec<&ConversationSummary> {
        let needle = query.trim().to_lowercase();
        self.list(category)
            .into_iter()
            .filter(|s| needle.is_empty() || s.matches(&needle))
            .collect()
    }

    /// Focuses a conversation and clears its unread count.
    ///
    /// Returns the focused row, or `None` if no visible row has that id.
    pub fn select(&mut self, id: &ConversationId) -> Option<&ConversationSummary> {
        if self.hidden.contains(id) {
            return None;
        }
        let mut found = None;
        for (category, list) in &mut self.lists {
            for row in list.iter_mut().filter(|s| &s.id == id) {
                row.unread_count = 0;
                found.get_or_insert(*category);
            }
        }
        let category = found?;
        self.focused = Some(id.clone());
        self.lists
            .get(&category)
            .and_then(|list| list.iter().find(|s| &s.id == id))
    }

    pub fn focused(&self) -> Option<&ConversationId> {
        self.focused.as_ref()
    }

    /// Updates a chat row after one of its messages was finalized.
    ///
    /// Messages from the counterpart bump the unread count unless the
    /// conversation is focused. Returns `false` if no chat row has that id.
    pub fn record_finalized(
        &mut self,
        id: &ConversationId,
        role: Role,
        content: &str,
        at: DateTime<Utc>,
    ) -> bool {
        let is_focused = self.focused.as_ref() == Some(id);
        let mut touched = false;
        for (category, list) in &mut self.lists {
            if *category == ConversationCategory::Escalation {
                continue;
            }
            for row in list.iter_mut().filter(|s| &s.id == id) {
                row.preview = Some(truncate_preview(content, self.preview_chars));
                row.last_message_at = Some(at);
                if role != Role::User && !is_focused {
                    row.unread_count = row.unread_count.saturating_add(1);
                }
                touched = true;
            }
            if touched {
                sort_newest_first(list);
            }
        }
        touched
    }

    /// Escalation rows grouped by status.
    pub fn escalation_partition(&self) -> EscalationPartition<'_> {
        let mut partition = EscalationPartition::default();
        for row in self.list(ConversationCategory::Escalation) {
            let Some(entry) = &row.escalation else {
                continue;
            };
            match entry.status {
                EscalationStatus::Pending => partition.pending.push(row),
                EscalationStatus::Answered => partition.answered.push(row),
                EscalationStatus::Declined => partition.declined.push(row),
            }
        }
        partition
    }

    /// Mirrors an escalation status change onto its row. Returns `false` if the row is unknown.
    pub fn set_escalation_status(&mut self, id: &EscalationId, status: EscalationStatus) -> bool {
        let Some(list) = self.lists.get_mut(&ConversationCategory::Escalation) else {
            return false;
        };
        let mut touched = false;
        for entry in list.iter_mut().filter_map(|s| s.escalation.as_mut()) {
            if entry.id == *id {
                entry.status = status;
                touched = true;
            }
        }
        touched
    }

    /// Total unread messages over the visible rows of a category.
    pub fn unread_count(&self, category: ConversationCategory) -> u32 {
        self.list(category)
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.unread_count))
    }

    /// Visible escalations still waiting for an answer.
    pub fn pending_count(&self) -> usize {
        self.escalation_partition().pending.len()
    }
}

fn sort_newest_first(list: &mut [ConversationSummary]) {
    list.sort_by_key(|s| Reverse(s.last_message_at));
}
