// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation queue commands: list, answer, decline.

use std::io::{BufRead, Write};

use murmur_client::ConversationClient;
use murmur_core::types::Escalation;
use murmur_core::{EscalationId, Layer, MurmurError};
use murmur_escalation::{AnswerDraft, DeclineOutcome};

pub async fn list(client: &ConversationClient, all: bool) -> Result<(), MurmurError> {
    client.refresh_escalations().await?;
    let escalations = client.escalations().await;
    let shown: Vec<&Escalation> = escalations
        .iter()
        .filter(|e| all || !e.status.is_terminal())
        .collect();
    if shown.is_empty() {
        println!("No escalations waiting.");
    }
    for escalation in shown {
        println!(
            "{:<16} {:<9} {}: {}",
            escalation.id.as_str(),
            escalation.status.to_string(),
            requester(escalation),
            escalation.question
        );
        if let Some(context) = &escalation.context_summary {
            println!("{:<26}{context}", "");
        }
    }
    Ok(())
}

pub async fn answer(
    client: &ConversationClient,
    id: &EscalationId,
    text: String,
    layer: Option<Layer>,
) -> Result<(), MurmurError> {
    let mut draft = AnswerDraft::new(text);
    if let Some(layer) = layer {
        draft = draft.with_layer(layer);
    }
    // Validate before any request so an empty answer never reaches the network.
    draft.validate()?;
    client.refresh_escalations().await?;
    let outcome = client.answer_escalation(id, &draft).await?;
    match outcome.knowledge_id {
        Some(knowledge) => println!("Answered {id} ({} layer, knowledge {knowledge}).", outcome.layer),
        None => println!("Answered {id} ({} layer).", outcome.layer),
    }
    Ok(())
}

pub async fn decline(
    client: &ConversationClient,
    id: &EscalationId,
    skip_prompt: bool,
) -> Result<(), MurmurError> {
    client.refresh_escalations().await?;
    let outcome = client
        .decline_escalation(id, |escalation| skip_prompt || confirm(escalation))
        .await?;
    match outcome {
        DeclineOutcome::Declined => println!("Declined {id}."),
        DeclineOutcome::Kept => println!("Kept {id}."),
    }
    Ok(())
}

fn requester(escalation: &Escalation) -> &str {
    escalation
        .requester
        .display_name
        .as_deref()
        .unwrap_or("Someone")
}

/// Asks on the terminal before an irreversible decline.
fn confirm(escalation: &Escalation) -> bool {
    print!(
        "Decline the question from {} \"{}\"? This cannot be undone. [y/N] ",
        requester(escalation),
        escalation.question
    );
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
