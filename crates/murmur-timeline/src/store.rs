// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message timeline store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use murmur_core::types::HistoryMessage;
use murmur_core::{ConversationId, MessageId, MurmurError, Role};
use tracing::debug;

use crate::message::{FailureReason, Message, MessageState};

/// Ordered message timelines for every loaded conversation.
///
/// Each timeline is kept sorted by `created_at`, ties broken by insertion
/// order. Messages are addressed by [`MessageId`]; a provisional id keeps
/// resolving after the server id replaced it.
#[derive(Debug, Default)]
pub struct TimelineStore {
    timelines: HashMap<ConversationId, Vec<Message>>,
    index: HashMap<MessageId, ConversationId>,
    aliases: HashMap<MessageId, MessageId>,
    next_seq: u64,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the user's message before the backend has seen it.
    pub fn append_optimistic(
        &mut self,
        conversation_id: &ConversationId,
        content: impl Into<String>,
    ) -> MessageId {
        self.insert(
            conversation_id,
            MessageId::provisional(),
            Role::User,
            content.into(),
            Utc::now(),
            MessageState::Optimistic,
        )
    }

    /// Inserts an empty agent message that tokens will stream into.
    pub fn begin_streaming_placeholder(&mut self, conversation_id: &ConversationId) -> MessageId {
        self.insert(
            conversation_id,
            MessageId::provisional(),
            Role::Agent,
            String::new(),
            Utc::now(),
            MessageState::Streaming,
        )
    }

    /// Inserts a message that is already final, such as a non-streamed reply or a notice.
    pub fn insert_finalized(
        &mut self,
        conversation_id: &ConversationId,
        role: Role,
        content: impl Into<String>,
        server_id: Option<String>,
    ) -> MessageId {
        let id = server_id.map_or_else(MessageId::provisional, MessageId::Server);
        if self.index.contains_key(&id) {
            self.remove(&id);
        }
        self.insert(
            conversation_id,
            id,
            role,
            content.into(),
            Utc::now(),
            MessageState::Finalized,
        )
    }

    /// Appends one streamed token to a streaming message.
    pub fn append_token(&mut self, id: &MessageId, token: &str) -> Result<(), MurmurError> {
        self.find_mut(id)?.push_token(token)
    }

    /// Marks an optimistic message as accepted by the backend.
    ///
    /// Confirming an already-finalized message is a no-op.
    pub fn confirm(&mut self, id: &MessageId) -> Result<(), MurmurError> {
        let message = self.find_mut(id)?;
        if *message.state() == MessageState::Finalized {
            return Ok(());
        }
        if *message.state() != MessageState::Optimistic {
            return Err(MurmurError::InvalidState(format!(
                "only optimistic messages can be confirmed, {id} is {}",
                message.state()
            )));
        }
        message.transition(MessageState::Finalized)
    }

    /// Replaces a provisional id with the id the backend assigned.
    ///
    /// If a copy with that id is already present, for example from a history
    /// reload that raced the stream, the copy is dropped so the message
    /// appears once.
    pub fn assign_server_id(
        &mut self,
        id: &MessageId,
        server_id: impl Into<String>,
    ) -> Result<MessageId, MurmurError> {
        let current = self.resolve(id);
        let server = MessageId::Server(server_id.into());
        if current == server {
            return Ok(server);
        }
        if *self.find(&current)?.state() == MessageState::Finalized {
            return Err(MurmurError::InvalidState(format!(
                "message {current} is finalized, its id is frozen"
            )));
        }
        if self.index.contains_key(&server) {
            debug!(id = %server, "dropping duplicate of streamed message");
            self.remove(&server);
        }

        let conversation_id = self.locate(&current)?.clone();
        self.find_mut(&current)?.set_id(server.clone());
        self.index.remove(&current);
        self.index.insert(server.clone(), conversation_id);
        self.aliases.insert(current, server.clone());
        Ok(server)
    }

    /// Freezes a message. Finalizing twice is a no-op.
    pub fn finalize(&mut self, id: &MessageId) -> Result<(), MurmurError> {
        let message = self.find_mut(id)?;
        if *message.state() == MessageState::Finalized {
            return Ok(());
        }
        message.transition(MessageState::Finalized)
    }

    /// Removes an in-flight message from its timeline and returns it in the `Failed` state.
    ///
    /// Finalized messages cannot fail.
    pub fn fail(&mut self, id: &MessageId, reason: FailureReason) -> Result<Message, MurmurError> {
        let current = self.resolve(id);
        self.find_mut(&current)?
            .transition(MessageState::Failed(reason.clone()))?;
        let removed = self.remove(&current).ok_or_else(|| MurmurError::NotFound {
            kind: "message",
            id: current.to_string(),
        })?;
        debug!(id = %current, %reason, "message removed from timeline");
        Ok(removed)
    }

    /// Replaces a conversation's timeline with the server's history.
    ///
    /// Server rows win over local finalized copies. Messages still in flight
    /// (optimistic or streaming) are kept and merged back in by timestamp.
    /// Missing fields get defaults: role `agent`, empty content, the previous
    /// row's timestamp, and a synthesized id. Returns the number of server rows.
    pub fn reconcile(&mut self, conversation_id: &ConversationId, history: Vec<HistoryMessage>) -> usize {
        let loaded_at = Utc::now();
        let (in_flight, stale): (Vec<Message>, Vec<Message>) = self
            .timelines
            .remove(conversation_id)
            .unwrap_or_default()
            .into_iter()
            .partition(|m| m.state().is_in_flight());
        for message in &stale {
            self.index.remove(message.id());
        }

        let count = history.len();
        let mut last_seen = history
            .iter()
            .find_map(|row| row.created_at)
            .unwrap_or(loaded_at);
        let mut rebuilt = Vec::with_capacity(count);
        for (position, row) in history.into_iter().enumerate() {
            let created_at = row.created_at.unwrap_or(last_seen);
            last_seen = created_at;
            let id = MessageId::Server(
                row.id
                    .unwrap_or_else(|| format!("{conversation_id}:{position}")),
            );
            if self.index.contains_key(&id) {
                debug!(%id, "history row already present locally, keeping the local copy");
                continue;
            }
            let seq = self.bump_seq();
            self.index.insert(id.clone(), conversation_id.clone());
            rebuilt.push(
                Message::new(
                    id,
                    conversation_id.clone(),
                    row.role.unwrap_or(Role::Agent),
                    row.content.unwrap_or_default(),
                    created_at,
                    MessageState::Finalized,
                    seq,
                )
                .with_validated(row.is_validated),
            );
        }
        rebuilt.sort_by_key(Message::sort_key);
        self.timelines.insert(conversation_id.clone(), rebuilt);

        if !in_flight.is_empty() {
            debug!(
                conversation = %conversation_id,
                kept = in_flight.len(),
                "keeping in-flight messages across reload"
            );
        }
        for message in in_flight {
            self.place(conversation_id, message);
        }
        self.aliases.retain(|_, target| self.index.contains_key(target));
        count
    }

    /// The ordered timeline of a conversation; empty if never loaded.
    pub fn messages(&self, conversation_id: &ConversationId) -> &[Message] {
        self.timelines
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Looks up a message by its current or any former id.
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.find(&self.resolve(id)).ok()
    }

    /// The message currently receiving tokens in a conversation, if any.
    pub fn streaming_message(&self, conversation_id: &ConversationId) -> Option<&Message> {
        self.messages(conversation_id)
            .iter()
            .find(|m| *m.state() == MessageState::Streaming)
    }

    /// Follows provisional-to-server reassignments to the current id.
    pub fn resolve(&self, id: &MessageId) -> MessageId {
        let mut current = id;
        while let Some(next) = self.aliases.get(current) {
            current = next;
        }
        current.clone()
    }

    fn insert(
        &mut self,
        conversation_id: &ConversationId,
        id: MessageId,
        role: Role,
        content: String,
        created_at: DateTime<Utc>,
        state: MessageState,
    ) -> MessageId {
        let seq = self.bump_seq();
        let message = Message::new(
            id.clone(),
            conversation_id.clone(),
            role,
            content,
            created_at,
            state,
            seq,
        );
        self.index.insert(id.clone(), conversation_id.clone());
        self.place(conversation_id, message);
        id
    }

    fn place(&mut self, conversation_id: &ConversationId, message: Message) {
        let timeline = self.timelines.entry(conversation_id.clone()).or_default();
        let key = message.sort_key();
        let at = timeline.partition_point(|m| m.sort_key() <= key);
        timeline.insert(at, message);
    }

    fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let conversation_id = self.index.remove(id)?;
        let timeline = self.timelines.get_mut(&conversation_id)?;
        let at = timeline.iter().position(|m| m.id() == id)?;
        Some(timeline.remove(at))
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn locate(&self, id: &MessageId) -> Result<&ConversationId, MurmurError> {
        self.index.get(id).ok_or_else(|| MurmurError::NotFound {
            kind: "message",
            id: id.to_string(),
        })
    }

    fn find(&self, id: &MessageId) -> Result<&Message, MurmurError> {
        let conversation_id = self.locate(id)?;
        self.timelines
            .get(conversation_id)
            .and_then(|t| t.iter().find(|m| m.id() == id))
            .ok_or_else(|| MurmurError::NotFound {
                kind: "message",
                id: id.to_string(),
            })
    }

    fn find_mut(&mut self, id: &MessageId) -> Result<&mut Message, MurmurError> {
        let current = self.resolve(id);
        let conversation_id = self.locate(&current)?.clone();
        self.timelines
            .get_mut(&conversation_id)
            .and_then(|t| t.iter_mut().find(|m| *m.id() == current))
            .ok_or_else(|| MurmurError::NotFound {
                kind: "message",
                id: current.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conv(id: &str) -> ConversationId {
        ConversationId::from(id)
    }

    fn row(id: &str, role: Role, content: &str, minute: u32) -> HistoryMessage {
        HistoryMessage {
            id: Some(id.into()),
            role: Some(role),
            content: Some(content.into()),
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()),
            is_validated: None,
        }
    }

    fn contents(store: &TimelineStore, c: &ConversationId) -> Vec<String> {
        store
            .messages(c)
            .iter()
            .map(|m| m.content().to_string())
            .collect()
    }

    #[test]
    fn stream_happy_path() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let user = store.append_optimistic(&c, "Hi");
        let reply = store.begin_streaming_placeholder(&c);

        store.confirm(&user).unwrap();
        store.append_token(&reply, "Hel").unwrap();
        store.append_token(&reply, "lo").unwrap();
        let server = store.assign_server_id(&reply, "m1").unwrap();
        store.finalize(&server).unwrap();

        let timeline = store.messages(&c);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].role(), Role::User);
        assert_eq!(*timeline[0].state(), MessageState::Finalized);
        assert_eq!(timeline[1].content(), "Hello");
        assert_eq!(*timeline[1].id(), MessageId::Server("m1".into()));
        assert_eq!(*timeline[1].state(), MessageState::Finalized);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        for text in ["first", "second", "third"] {
            store.insert(
                &c,
                MessageId::provisional(),
                Role::User,
                text.into(),
                at,
                MessageState::Finalized,
            );
        }
        assert_eq!(contents(&store, &c), ["first", "second", "third"]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let reply = store.begin_streaming_placeholder(&c);
        store.append_token(&reply, "done").unwrap();
        store.finalize(&reply).unwrap();
        store.finalize(&reply).unwrap();
        assert_eq!(store.get(&reply).unwrap().content(), "done");
    }

    #[test]
    fn finalized_messages_are_frozen() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let reply = store.begin_streaming_placeholder(&c);
        store.finalize(&reply).unwrap();

        assert!(matches!(
            store.append_token(&reply, "late"),
            Err(MurmurError::InvalidState(_))
        ));
        assert!(matches!(
            store.fail(&reply, FailureReason::Canceled),
            Err(MurmurError::InvalidState(_))
        ));
        assert!(matches!(
            store.assign_server_id(&reply, "m9"),
            Err(MurmurError::InvalidState(_))
        ));
        assert_eq!(store.messages(&c).len(), 1);
    }

    #[test]
    fn fail_removes_and_returns_message() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let user = store.append_optimistic(&c, "Hi");
        let reply = store.begin_streaming_placeholder(&c);
        store.append_token(&reply, "par").unwrap();

        let failed = store.fail(&reply, FailureReason::Canceled).unwrap();
        assert_eq!(failed.content(), "par");
        assert_eq!(*failed.state(), MessageState::Failed(FailureReason::Canceled));
        store.fail(&user, FailureReason::Canceled).unwrap();

        assert!(store.messages(&c).is_empty());
        assert!(store.get(&reply).is_none());
        assert!(matches!(
            store.finalize(&reply),
            Err(MurmurError::NotFound { .. })
        ));
    }

    #[test]
    fn provisional_id_resolves_after_assignment() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let reply = store.begin_streaming_placeholder(&c);
        store.assign_server_id(&reply, "m1").unwrap();

        store.append_token(&reply, "still works").unwrap();
        store.finalize(&reply).unwrap();
        assert_eq!(*store.get(&reply).unwrap().id(), MessageId::Server("m1".into()));
    }

    #[test]
    fn server_id_assignment_drops_reloaded_duplicate() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        let reply = store.begin_streaming_placeholder(&c);
        store.reconcile(&c, vec![row("m1", Role::Agent, "Hello", 0)]);
        assert_eq!(store.messages(&c).len(), 2);

        store.assign_server_id(&reply, "m1").unwrap();
        assert_eq!(store.messages(&c).len(), 1);
        assert_eq!(*store.messages(&c)[0].state(), MessageState::Streaming);
    }

    #[test]
    fn reconcile_replaces_finalized_and_keeps_in_flight() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        store.insert_finalized(&c, Role::Agent, "stale local copy", Some("m1".into()));
        let pending = store.append_optimistic(&c, "in flight");

        let count = store.reconcile(
            &c,
            vec![
                row("m0", Role::User, "hi", 0),
                row("m1", Role::Agent, "server copy", 1),
            ],
        );

        assert_eq!(count, 2);
        assert_eq!(contents(&store, &c), ["hi", "server copy", "in flight"]);
        assert_eq!(*store.get(&pending).unwrap().state(), MessageState::Optimistic);
    }

    #[test]
    fn reconcile_fills_missing_fields() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        store.reconcile(
            &c,
            vec![
                row("m0", Role::User, "q", 5),
                HistoryMessage {
                    is_validated: Some(true),
                    ..HistoryMessage::default()
                },
            ],
        );

        let timeline = store.messages(&c);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[1].role(), Role::Agent);
        assert_eq!(timeline[1].content(), "");
        assert_eq!(timeline[1].created_at(), timeline[0].created_at());
        assert_eq!(timeline[1].validated(), Some(true));
        assert_eq!(*timeline[1].id(), MessageId::Server("c1:1".into()));
    }

    #[test]
    fn reconcile_sorts_by_timestamp() {
        let c = conv("c1");
        let mut store = TimelineStore::new();
        store.reconcile(
            &c,
            vec![
                row("m2", Role::Agent, "later", 9),
                row("m1", Role::User, "earlier", 3),
            ],
        );
        assert_eq!(contents(&store, &c), ["earlier", "later"]);
    }

    #[test]
    fn conversations_are_isolated() {
        let mut store = TimelineStore::new();
        store.append_optimistic(&conv("a"), "for a");
        store.append_optimistic(&conv("b"), "for b");
        store.reconcile(&conv("a"), Vec::new());

        assert_eq!(contents(&store, &conv("a")), ["for a"]);
        assert_eq!(contents(&store, &conv("b")), ["for b"]);
    }
}
