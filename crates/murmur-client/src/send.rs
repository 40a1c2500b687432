// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The streamed send task and its cancellation handle.
//!
//! A send runs as its own tokio task: it posts the message, decodes the
//! reply frames and applies each event to the timeline in arrival order.
//! The task races the stream against a [`CancellationToken`]; canceling
//! drops the response body, which stops the decoder and closes the
//! connection.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use murmur_core::{ConversationId, MessageId, MurmurError, Role};
use murmur_stream::{StreamEvent, decode_stream};
use murmur_timeline::FailureReason;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Shared;
use crate::inflight::InflightTicket;

/// Notice left in the timeline when the user cancels a reply.
pub const CANCELED_NOTICE: &str = "Reply canceled.";

/// A finished reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Final id of the agent's reply; the server's id when it sent one.
    pub message_id: MessageId,
    pub content: String,
}

/// Handle to one outstanding send.
///
/// Dropping the handle does not cancel the send.
#[derive(Debug)]
pub struct SendHandle {
    conversation_id: ConversationId,
    user_message: MessageId,
    reply_message: MessageId,
    cancel: CancellationToken,
    task: JoinHandle<Result<SendOutcome, MurmurError>>,
}

impl SendHandle {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Provisional id of the user's message.
    pub fn user_message(&self) -> &MessageId {
        &self.user_message
    }

    /// Provisional id of the streaming reply placeholder.
    pub fn reply_message(&self) -> &MessageId {
        &self.reply_message
    }

    /// Aborts the send. Canceling a finished or already-canceled send does nothing.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the reply.
    ///
    /// A canceled send resolves to [`MurmurError::Canceled`].
    pub async fn wait(self) -> Result<SendOutcome, MurmurError> {
        self.task
            .await
            .map_err(|e| MurmurError::Internal(format!("send task ended abnormally: {e}")))?
    }
}

/// Everything the send task needs, moved into it at spawn.
pub(crate) struct SendJob {
    pub shared: Arc<Shared>,
    pub conversation_id: ConversationId,
    pub text: String,
    pub user_message: MessageId,
    pub reply_message: MessageId,
    pub ticket: InflightTicket,
}

pub(crate) fn spawn(job: SendJob, cancel: CancellationToken) -> SendHandle {
    let handle_cancel = cancel.clone();
    let conversation_id = job.conversation_id.clone();
    let user_message = job.user_message.clone();
    let reply_message = job.reply_message.clone();

    let task = tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MurmurError::Canceled),
            result = stream_reply(&job) => result,
        };
        let outcome = match result {
            Ok(server_id) => complete(&job, server_id),
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            withdraw(&job, e);
        }
        drop(job.ticket);
        outcome
    });

    SendHandle {
        conversation_id,
        user_message,
        reply_message,
        cancel: handle_cancel,
        task,
    }
}

/// Posts the message and applies reply events until `complete` or end of stream.
///
/// Returns the server's id for the reply, if the stream carried one.
async fn stream_reply(job: &SendJob) -> Result<Option<String>, MurmurError> {
    let bytes = job
        .shared
        .backend
        .send_streaming(&job.conversation_id, &job.text)
        .await?;
    let mut events = decode_stream(bytes);

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Start { model } => {
                // The user's message is confirmed with the reply, not here.
                debug!(conversation_id = %job.conversation_id, ?model, "reply started");
            }
            StreamEvent::Token(token) => {
                job.shared
                    .state()
                    .timeline
                    .append_token(&job.reply_message, &token)?;
            }
            StreamEvent::Complete { message_id } => return Ok(message_id),
            StreamEvent::Error { message } => {
                return Err(MurmurError::Transport {
                    message,
                    source: None,
                });
            }
        }
    }
    debug!(conversation_id = %job.conversation_id, "stream closed without complete frame");
    Ok(None)
}

fn complete(job: &SendJob, server_id: Option<String>) -> Result<SendOutcome, MurmurError> {
    let mut state = job.shared.state();
    if let Err(e) = state.timeline.confirm(&job.user_message) {
        debug!(error = %e, "user message not confirmed on completion");
    }

    let id = match server_id {
        Some(server_id) => state
            .timeline
            .assign_server_id(&job.reply_message, server_id)?,
        None => state.timeline.resolve(&job.reply_message),
    };
    state.timeline.finalize(&id)?;
    let content = state
        .timeline
        .get(&id)
        .map(|m| m.content().to_string())
        .unwrap_or_default();
    state
        .directory
        .record_finalized(&job.conversation_id, Role::Agent, &content, Utc::now());

    info!(
        conversation_id = %job.conversation_id,
        message_id = %id,
        chars = content.chars().count(),
        "reply finalized"
    );
    Ok(SendOutcome {
        message_id: id,
        content,
    })
}

/// Removes the in-flight messages of a failed send and gives the text back.
fn withdraw(job: &SendJob, error: &MurmurError) {
    let reason = FailureReason::from_error(error);
    let mut state = job.shared.state();

    if let Err(e) = state.timeline.fail(&job.reply_message, reason.clone()) {
        debug!(error = %e, "reply placeholder already gone");
    }
    if let Err(e) = state.timeline.fail(&job.user_message, reason.clone()) {
        debug!(error = %e, "user message already gone");
    }
    state.composer.restore(&job.conversation_id, &job.text);

    if reason.is_canceled() {
        state.timeline.insert_finalized(
            &job.conversation_id,
            Role::System,
            CANCELED_NOTICE,
            None,
        );
        info!(conversation_id = %job.conversation_id, "send canceled");
    } else {
        warn!(conversation_id = %job.conversation_id, error = %error, "send failed");
    }
}
