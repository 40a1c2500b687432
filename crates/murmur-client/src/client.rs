// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation client context.
//!
//! [`ConversationClient`] owns one signed-in session: the backend, the
//! timeline store, the conversation directory, the composer drafts, the
//! escalation controller and the list cache. It is cheap to clone; clones
//! share the same session. [`ConversationClient::shutdown`] tears the
//! session down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use murmur_cache::ConversationCache;
use murmur_config::model::MurmurConfig;
use murmur_core::types::{Escalation, SimpleReply};
use murmur_core::{
    AgentId, Backend, ConversationCategory, ConversationId, EscalationId, EscalationStatus,
    MurmurError, Role,
};
use murmur_directory::{ConversationSummary, Directory};
use murmur_escalation::{AnswerDraft, AnswerOutcome, DeclineOutcome, EscalationController};
use murmur_timeline::{Composer, FailureReason, Message, TimelineStore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::inflight::InflightGuard;
use crate::send::{self, SendHandle, SendJob};

/// Result of a load that may have been de-duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The load ran; carries the number of rows received.
    Loaded(usize),
    /// An identical load was already outstanding; this one was dropped.
    AlreadyInFlight,
}

/// Client-side state guarded by one lock.
///
/// The lock is never held across an await.
pub(crate) struct ClientState {
    pub timeline: TimelineStore,
    pub directory: Directory,
    pub composer: Composer,
}

pub(crate) struct Shared {
    pub backend: Arc<dyn Backend>,
    cache: Option<ConversationCache>,
    state: Mutex<ClientState>,
    escalations: tokio::sync::Mutex<EscalationController>,
    inflight: InflightGuard,
    shutdown: CancellationToken,
}

impl Shared {
    pub fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One signed-in session against a [`Backend`].
#[derive(Clone)]
pub struct ConversationClient {
    shared: Arc<Shared>,
}

impl ConversationClient {
    pub fn new(backend: Arc<dyn Backend>, config: &MurmurConfig) -> Self {
        let escalations = EscalationController::new(Arc::clone(&backend), config.escalation.clone());
        let shared = Shared {
            backend,
            cache: ConversationCache::from_config(&config.cache),
            state: Mutex::new(ClientState {
                timeline: TimelineStore::new(),
                directory: Directory::new(config.client.preview_chars),
                composer: Composer::new(),
            }),
            escalations: tokio::sync::Mutex::new(escalations),
            inflight: InflightGuard::new(),
            shutdown: CancellationToken::new(),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Fills the directory from the on-disk cache. Returns the number of rows loaded.
    ///
    /// Cache failures are logged and treated as misses.
    pub async fn warm_start(&self) -> usize {
        let Some(cache) = &self.shared.cache else {
            return 0;
        };
        let mut loaded = 0;
        for category in ConversationCategory::ALL {
            match cache.load(category).await {
                Ok(Some(rows)) => {
                    loaded += rows.len();
                    self.shared.state().directory.replace_category(category, rows);
                }
                Ok(None) => {}
                Err(e) => warn!(%category, error = %e, "conversation cache unreadable"),
            }
        }
        debug!(rows = loaded, "directory warmed from cache");
        loaded
    }

    /// Refreshes every category in the background, logging failures.
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            for category in ConversationCategory::ALL {
                if let Err(e) = client.refresh_conversations(category).await {
                    warn!(%category, error = %e, "background refresh failed");
                }
            }
        })
    }

    /// Reloads one category's list from the backend and caches it.
    pub async fn refresh_conversations(
        &self,
        category: ConversationCategory,
    ) -> Result<LoadOutcome, MurmurError> {
        if category == ConversationCategory::Escalation {
            return self.refresh_escalations().await;
        }
        let Some(_ticket) = self.shared.inflight.try_begin(format!("conversations:{category}"))
        else {
            return Ok(LoadOutcome::AlreadyInFlight);
        };

        let records = self.shared.backend.list_conversations(category).await?;
        let rows: Vec<ConversationSummary> = {
            let mut state = self.shared.state();
            let preview_chars = state.directory.preview_chars();
            let rows: Vec<_> = records
                .into_iter()
                .map(|r| ConversationSummary::from_record(r, preview_chars))
                .collect();
            state.directory.replace_category(category, rows.clone());
            rows
        };
        self.store_in_cache(category, &rows).await;
        Ok(LoadOutcome::Loaded(rows.len()))
    }

    /// Visible rows of one category.
    pub fn conversations(&self, category: ConversationCategory) -> Vec<ConversationSummary> {
        self.shared
            .state()
            .directory
            .list(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn search(&self, category: ConversationCategory, query: &str) -> Vec<ConversationSummary> {
        self.shared
            .state()
            .directory
            .search(category, query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn unread_count(&self, category: ConversationCategory) -> u32 {
        self.shared.state().directory.unread_count(category)
    }

    pub fn hide(&self, conversation_id: &ConversationId) {
        self.shared.state().directory.hide(conversation_id);
    }

    pub fn focused(&self) -> Option<ConversationId> {
        self.shared.state().directory.focused().cloned()
    }

    /// Focuses a conversation and loads its history.
    ///
    /// Sends still running in the previously focused conversation continue.
    pub async fn select_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<LoadOutcome, MurmurError> {
        let known = self
            .shared
            .state()
            .directory
            .select(conversation_id)
            .is_some();
        if !known {
            return Err(MurmurError::NotFound {
                kind: "conversation",
                id: conversation_id.to_string(),
            });
        }
        self.load_history(conversation_id).await
    }

    /// Loads a conversation's history and reconciles it into the timeline.
    ///
    /// A second load for the same conversation while one is outstanding is dropped.
    pub async fn load_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<LoadOutcome, MurmurError> {
        let Some(_ticket) = self
            .shared
            .inflight
            .try_begin(format!("history:{conversation_id}"))
        else {
            return Ok(LoadOutcome::AlreadyInFlight);
        };

        let history = self.shared.backend.load_history(conversation_id).await?;
        let rows = self
            .shared
            .state()
            .timeline
            .reconcile(conversation_id, history);
        debug!(%conversation_id, rows, "history loaded");
        Ok(LoadOutcome::Loaded(rows))
    }

    /// Snapshot of a conversation's timeline.
    pub fn messages(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.shared
            .state()
            .timeline
            .messages(conversation_id)
            .to_vec()
    }

    pub fn set_draft(&self, conversation_id: &ConversationId, text: impl Into<String>) {
        self.shared.state().composer.set_draft(conversation_id, text);
    }

    pub fn draft(&self, conversation_id: &ConversationId) -> String {
        self.shared.state().composer.draft(conversation_id).to_string()
    }

    /// Sends the conversation's draft and streams the reply.
    ///
    /// The user's message appears immediately as optimistic and an empty
    /// agent placeholder follows it. Only one send per conversation runs at
    /// a time. On failure or cancellation both messages are removed and the
    /// draft is restored.
    pub fn send(&self, conversation_id: &ConversationId) -> Result<SendHandle, MurmurError> {
        let Some(ticket) = self
            .shared
            .inflight
            .try_begin(format!("send:{conversation_id}"))
        else {
            return Err(MurmurError::InvalidState(format!(
                "a reply is still streaming in {conversation_id}"
            )));
        };

        let (text, user_message, reply_message) = {
            let mut state = self.shared.state();
            let text = state.composer.take_for_send(conversation_id);
            if text.trim().is_empty() {
                state.composer.set_draft(conversation_id, text);
                return Err(MurmurError::Validation("message is empty".into()));
            }
            let user_message = state.timeline.append_optimistic(conversation_id, text.clone());
            let reply_message = state.timeline.begin_streaming_placeholder(conversation_id);
            (text, user_message, reply_message)
        };
        debug!(%conversation_id, %user_message, "send dispatched");

        let job = SendJob {
            shared: Arc::clone(&self.shared),
            conversation_id: conversation_id.clone(),
            text,
            user_message,
            reply_message,
            ticket,
        };
        Ok(send::spawn(job, self.shared.shutdown.child_token()))
    }

    /// Asks an agent on the non-streamed path.
    ///
    /// With a known conversation the question shows as optimistic while
    /// waiting and is removed again on failure. The composer is left alone.
    pub async fn ask(
        &self,
        agent_id: &AgentId,
        conversation_id: Option<&ConversationId>,
        text: &str,
    ) -> Result<SimpleReply, MurmurError> {
        if text.trim().is_empty() {
            return Err(MurmurError::Validation("message is empty".into()));
        }
        let pending =
            conversation_id.map(|id| self.shared.state().timeline.append_optimistic(id, text));

        let reply = match self
            .shared
            .backend
            .send_simple(agent_id, text, conversation_id)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                if let Some(message) = &pending
                    && let Err(fail) = self
                        .shared
                        .state()
                        .timeline
                        .fail(message, FailureReason::from_error(&e))
                {
                    debug!(error = %fail, "question already gone");
                }
                warn!(%agent_id, error = %e, "question not answered");
                return Err(e);
            }
        };

        let mut state = self.shared.state();
        match &pending {
            Some(message) => state.timeline.confirm(message)?,
            None => {
                state
                    .timeline
                    .insert_finalized(&reply.conversation_id, Role::User, text, None);
            }
        }
        state.timeline.insert_finalized(
            &reply.conversation_id,
            Role::Agent,
            reply.answer.as_str(),
            None,
        );
        state
            .directory
            .record_finalized(&reply.conversation_id, Role::Agent, &reply.answer, Utc::now());
        info!(%agent_id, conversation_id = %reply.conversation_id, layer = %reply.layer_used, "question answered");
        Ok(reply)
    }

    /// Opens a direct chat with an agent and focuses it.
    pub async fn start_chat(&self, agent_id: &AgentId) -> Result<ConversationSummary, MurmurError> {
        let record = self.shared.backend.start_chat(agent_id).await?;
        let mut state = self.shared.state();
        let summary = ConversationSummary::from_record(record, state.directory.preview_chars());
        state.directory.upsert(summary.clone());
        state.directory.select(&summary.id);
        info!(%agent_id, conversation_id = %summary.id, "chat started");
        Ok(summary)
    }

    /// Reloads the escalation queue and mirrors it into the directory.
    pub async fn refresh_escalations(&self) -> Result<LoadOutcome, MurmurError> {
        let Some(_ticket) = self.shared.inflight.try_begin("escalations") else {
            return Ok(LoadOutcome::AlreadyInFlight);
        };

        let rows: Vec<ConversationSummary> = {
            let mut controller = self.shared.escalations.lock().await;
            let escalations = controller.refresh().await?;
            let mut state = self.shared.state();
            let preview_chars = state.directory.preview_chars();
            let rows: Vec<_> = escalations
                .iter()
                .map(|e| ConversationSummary::from_escalation(e, preview_chars))
                .collect();
            state
                .directory
                .replace_category(ConversationCategory::Escalation, rows.clone());
            rows
        };
        self.store_in_cache(ConversationCategory::Escalation, &rows)
            .await;
        Ok(LoadOutcome::Loaded(rows.len()))
    }

    /// The escalation queue as last refreshed.
    pub async fn escalations(&self) -> Vec<Escalation> {
        self.shared.escalations.lock().await.escalations().to_vec()
    }

    pub fn pending_escalations(&self) -> usize {
        self.shared.state().directory.pending_count()
    }

    /// Answers an escalation; see [`EscalationController::answer`].
    pub async fn answer_escalation(
        &self,
        id: &EscalationId,
        draft: &AnswerDraft,
    ) -> Result<AnswerOutcome, MurmurError> {
        let outcome = self.shared.escalations.lock().await.answer(id, draft).await?;
        self.shared
            .state()
            .directory
            .set_escalation_status(id, EscalationStatus::Answered);
        Ok(outcome)
    }

    /// Declines an escalation once `confirm` approves it.
    pub async fn decline_escalation<F>(
        &self,
        id: &EscalationId,
        confirm: F,
    ) -> Result<DeclineOutcome, MurmurError>
    where
        F: FnOnce(&Escalation) -> bool,
    {
        let outcome = self
            .shared
            .escalations
            .lock()
            .await
            .decline(id, confirm)
            .await?;
        if outcome == DeclineOutcome::Declined {
            self.shared
                .state()
                .directory
                .set_escalation_status(id, EscalationStatus::Declined);
        }
        Ok(outcome)
    }

    /// Ends the session: cancels every outstanding send and drops the credential.
    ///
    /// Calling it twice is harmless.
    pub async fn shutdown(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        self.shared.shutdown.cancel();
        self.shared.backend.end_session().await;
        info!(backend = self.shared.backend.name(), "session closed");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    async fn store_in_cache(&self, category: ConversationCategory, rows: &[ConversationSummary]) {
        if let Some(cache) = &self.shared.cache
            && let Err(e) = cache.store(category, rows).await
        {
            warn!(%category, error = %e, "conversation cache not updated");
        }
    }
}
