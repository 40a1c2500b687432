// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation queue and answer/decline workflows.

use std::sync::Arc;

use murmur_config::model::EscalationConfig;
use murmur_core::types::{Escalation, KnowledgeDraft};
use murmur_core::{Backend, EscalationId, EscalationStatus, Layer, MurmurError};
use tracing::{debug, info, warn};

use crate::draft::{AnswerDraft, knowledge_title};

/// Result of a completed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub escalation_id: EscalationId,
    /// Id of the knowledge artifact created from the answer, if the backend returned one.
    pub knowledge_id: Option<String>,
    pub layer: Layer,
}

/// Result of a decline request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineOutcome {
    Declined,
    /// The owner did not confirm; nothing was sent.
    Kept,
}

/// Owns the escalation queue of the signed-in agent owner.
///
/// Answering runs two dependent calls: the answer is first published as
/// knowledge for the agent, then the escalation is marked answered. The
/// status only becomes `answered` when both succeed. A failure of the
/// second call is reported as [`MurmurError::PartialWorkflow`] and the
/// published knowledge is left in place.
pub struct EscalationController {
    backend: Arc<dyn Backend>,
    settings: EscalationConfig,
    escalations: Vec<Escalation>,
}

impl EscalationController {
    pub fn new(backend: Arc<dyn Backend>, settings: EscalationConfig) -> Self {
        Self {
            backend,
            settings,
            escalations: Vec::new(),
        }
    }

    /// Reloads the queue from the backend.
    pub async fn refresh(&mut self) -> Result<&[Escalation], MurmurError> {
        let escalations = self.backend.list_escalations().await?;
        debug!(count = escalations.len(), "escalation queue refreshed");
        self.escalations = escalations;
        Ok(&self.escalations)
    }

    pub fn escalations(&self) -> &[Escalation] {
        &self.escalations
    }

    pub fn get(&self, id: &EscalationId) -> Option<&Escalation> {
        self.escalations.iter().find(|e| e.id == *id)
    }

    /// Answers a pending escalation.
    ///
    /// The draft is validated before anything is sent. If publishing the
    /// knowledge fails the escalation stays pending and no further call is made.
    pub async fn answer(
        &mut self,
        id: &EscalationId,
        draft: &AnswerDraft,
    ) -> Result<AnswerOutcome, MurmurError> {
        let text = draft.validate()?.to_string();
        let escalation = self.pending(id)?.clone();
        let layer = draft.layer.unwrap_or(self.settings.default_layer);

        let knowledge = KnowledgeDraft {
            agent_id: escalation.agent_id.clone(),
            title: knowledge_title(&escalation.question),
            content: text.clone(),
            topic: self.settings.knowledge_topic.clone(),
            layer,
            is_pinned: self.settings.pin_answers,
        };
        let receipt = self.backend.publish_knowledge(&knowledge).await.map_err(|e| {
            warn!(escalation_id = %id, error = %e, "publishing answer as knowledge failed");
            e
        })?;
        debug!(escalation_id = %id, knowledge_id = ?receipt.id, "answer published as knowledge");

        if let Err(e) = self
            .backend
            .mark_escalation_answered(id, &text, layer)
            .await
        {
            warn!(
                escalation_id = %id,
                knowledge_id = ?receipt.id,
                error = %e,
                "escalation not marked answered after knowledge was published"
            );
            return Err(MurmurError::PartialWorkflow {
                message: format!(
                    "the answer was saved as knowledge but escalation {id} could not be marked answered: {e}"
                ),
                knowledge_id: receipt.id,
            });
        }

        self.set_status(id, EscalationStatus::Answered);
        info!(escalation_id = %id, %layer, "escalation answered");
        Ok(AnswerOutcome {
            escalation_id: id.clone(),
            knowledge_id: receipt.id,
            layer,
        })
    }

    /// Declines a pending escalation after `confirm` approves it.
    ///
    /// Declining cannot be undone, so `confirm` sees the escalation first.
    pub async fn decline<F>(&mut self, id: &EscalationId, confirm: F) -> Result<DeclineOutcome, MurmurError>
    where
        F: FnOnce(&Escalation) -> bool,
    {
        let escalation = self.pending(id)?;
        if !confirm(escalation) {
            debug!(escalation_id = %id, "decline not confirmed");
            return Ok(DeclineOutcome::Kept);
        }
        self.backend.decline_escalation(id).await?;
        self.set_status(id, EscalationStatus::Declined);
        info!(escalation_id = %id, "escalation declined");
        Ok(DeclineOutcome::Declined)
    }

    fn pending(&self, id: &EscalationId) -> Result<&Escalation, MurmurError> {
        let escalation = self.get(id).ok_or_else(|| MurmurError::NotFound {
            kind: "escalation",
            id: id.to_string(),
        })?;
        if escalation.status.is_terminal() {
            return Err(MurmurError::InvalidState(format!(
                "escalation {id} is already {}",
                escalation.status
            )));
        }
        Ok(escalation)
    }

    fn set_status(&mut self, id: &EscalationId, status: EscalationStatus) {
        for escalation in self.escalations.iter_mut().filter(|e| e.id == *id) {
            escalation.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::types::{KnowledgeReceipt, Requester};
    use murmur_core::{AgentId, ConversationId, ErrorKind};
    use murmur_test_utils::{Call, Endpoint, MockBackend, offline};
    use tracing_test::traced_test;

    fn escalation(id: &str, status: EscalationStatus) -> Escalation {
        Escalation {
            id: EscalationId::from(id),
            agent_id: AgentId::from("agent-7"),
            conversation_id: ConversationId::from("conv-3"),
            requester: Requester {
                id: "visitor-1".into(),
                display_name: Some("Sam".into()),
            },
            question: "Do you ship to Norway?".into(),
            context_summary: None,
            status,
            offered_at: None,
            accepted_at: None,
        }
    }

    async fn controller_with(
        items: Vec<Escalation>,
        settings: EscalationConfig,
    ) -> (EscalationController, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        backend.push_escalations(Ok(items)).await;
        let mut controller = EscalationController::new(backend.clone(), settings);
        controller.refresh().await.unwrap();
        (controller, backend)
    }

    async fn controller(items: Vec<Escalation>) -> (EscalationController, Arc<MockBackend>) {
        controller_with(items, EscalationConfig::default()).await
    }

    fn e1() -> EscalationId {
        EscalationId::from("e1")
    }

    #[tokio::test]
    async fn answer_runs_both_phases_in_order() {
        let settings = EscalationConfig {
            knowledge_topic: "shipping".into(),
            pin_answers: true,
            ..EscalationConfig::default()
        };
        let (mut controller, backend) =
            controller_with(vec![escalation("e1", EscalationStatus::Pending)], settings).await;
        backend
            .push_publish(Ok(KnowledgeReceipt {
                id: Some("k-42".into()),
            }))
            .await;

        let outcome = controller
            .answer(&e1(), &AnswerDraft::new("  Yes, within 5 days.  ").with_layer(Layer::Friends))
            .await
            .unwrap();

        assert_eq!(outcome.knowledge_id.as_deref(), Some("k-42"));
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Answered);

        let calls = backend.calls().await;
        let Call::PublishKnowledge(draft) = &calls[1] else {
            panic!("expected publish first, got {calls:?}");
        };
        assert_eq!(draft.agent_id, AgentId::from("agent-7"));
        assert_eq!(draft.title, "Do you ship to Norway?");
        assert_eq!(draft.content, "Yes, within 5 days.");
        assert_eq!(draft.topic, "shipping");
        assert_eq!(draft.layer, Layer::Friends);
        assert!(draft.is_pinned);
        assert_eq!(
            calls[2],
            Call::MarkAnswered {
                escalation_id: e1(),
                answer: "Yes, within 5 days.".into(),
                layer: Layer::Friends,
            }
        );
    }

    #[tokio::test]
    async fn layer_falls_back_to_configured_default() {
        let settings = EscalationConfig {
            default_layer: Layer::Intimate,
            ..EscalationConfig::default()
        };
        let (mut controller, _backend) =
            controller_with(vec![escalation("e1", EscalationStatus::Pending)], settings).await;
        let outcome = controller.answer(&e1(), &AnswerDraft::new("ok")).await.unwrap();
        assert_eq!(outcome.layer, Layer::Intimate);
    }

    #[tokio::test]
    async fn empty_answer_is_rejected_before_any_call() {
        let (mut controller, backend) =
            controller(vec![escalation("e1", EscalationStatus::Pending)]).await;

        for text in ["", "   \n\t"] {
            let err = controller.answer(&e1(), &AnswerDraft::new(text)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(backend.calls().await, vec![Call::ListEscalations]);
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Pending);
    }

    #[tokio::test]
    async fn publish_failure_leaves_escalation_pending() {
        let (mut controller, backend) =
            controller(vec![escalation("e1", EscalationStatus::Pending)]).await;
        backend.push_publish(Err(offline())).await;

        let err = controller.answer(&e1(), &AnswerDraft::new("answer")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Pending);
        assert!(backend.calls_to(Endpoint::MarkAnswered).await.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn mark_answered_failure_is_a_partial_workflow() {
        let (mut controller, backend) =
            controller(vec![escalation("e1", EscalationStatus::Pending)]).await;
        backend
            .push_publish(Ok(KnowledgeReceipt {
                id: Some("k-9".into()),
            }))
            .await;
        backend
            .push_mark_answered(Err(MurmurError::Http {
                status: 502,
                detail: "bad gateway".into(),
            }))
            .await;

        let err = controller.answer(&e1(), &AnswerDraft::new("answer")).await.unwrap_err();

        match err {
            MurmurError::PartialWorkflow { knowledge_id, .. } => {
                assert_eq!(knowledge_id.as_deref(), Some("k-9"));
            }
            other => panic!("expected PartialWorkflow, got {other:?}"),
        }
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Pending);
        assert!(logs_contain("escalation not marked answered"));
    }

    #[tokio::test]
    async fn terminal_escalations_cannot_be_answered_or_declined() {
        let (mut controller, backend) = controller(vec![
            escalation("e1", EscalationStatus::Answered),
            escalation("e2", EscalationStatus::Declined),
        ])
        .await;

        let err = controller.answer(&e1(), &AnswerDraft::new("again")).await.unwrap_err();
        assert!(matches!(err, MurmurError::InvalidState(_)));
        let err = controller
            .decline(&EscalationId::from("e2"), |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, MurmurError::InvalidState(_)));
        let err = controller
            .decline(&EscalationId::from("missing"), |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, MurmurError::NotFound { .. }));
        assert_eq!(backend.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn decline_requires_confirmation() {
        let (mut controller, backend) =
            controller(vec![escalation("e1", EscalationStatus::Pending)]).await;

        let outcome = controller
            .decline(&e1(), |e| {
                assert_eq!(e.question, "Do you ship to Norway?");
                false
            })
            .await
            .unwrap();
        assert_eq!(outcome, DeclineOutcome::Kept);
        assert!(backend.calls_to(Endpoint::Decline).await.is_empty());

        let outcome = controller.decline(&e1(), |_| true).await.unwrap();
        assert_eq!(outcome, DeclineOutcome::Declined);
        assert_eq!(backend.calls_to(Endpoint::Decline).await, vec![Call::Decline(e1())]);
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Declined);
    }

    #[tokio::test]
    async fn failed_decline_keeps_escalation_pending() {
        let (mut controller, backend) =
            controller(vec![escalation("e1", EscalationStatus::Pending)]).await;
        backend.push_decline(Err(offline())).await;

        assert!(controller.decline(&e1(), |_| true).await.is_err());
        assert_eq!(controller.get(&e1()).unwrap().status, EscalationStatus::Pending);
    }
}
