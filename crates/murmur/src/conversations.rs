// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation listing, history and the non-streamed ask.

use murmur_client::ConversationClient;
use murmur_core::{AgentId, ConversationCategory, ConversationId, MurmurError};
use murmur_directory::ConversationSummary;
use murmur_timeline::Message;

pub async fn list(
    client: &ConversationClient,
    category: ConversationCategory,
    search: Option<&str>,
) -> Result<(), MurmurError> {
    let cached = client.warm_start().await;
    if let Err(e) = client.refresh_conversations(category).await {
        if cached == 0 {
            return Err(e);
        }
        eprintln!("murmur: showing cached list, refresh failed: {e}");
    }

    let rows = match search {
        Some(query) => client.search(category, query),
        None => client.conversations(category),
    };
    if rows.is_empty() {
        println!("No conversations.");
    }
    for row in &rows {
        println!("{}", summary_line(row));
    }
    Ok(())
}

pub async fn start(client: &ConversationClient, agent_id: &AgentId) -> Result<(), MurmurError> {
    let summary = client.start_chat(agent_id).await?;
    println!("{}", summary_line(&summary));
    Ok(())
}

pub async fn history(
    client: &ConversationClient,
    conversation_id: &ConversationId,
) -> Result<(), MurmurError> {
    client.load_history(conversation_id).await?;
    for message in client.messages(conversation_id) {
        println!("{}", message_line(&message));
    }
    Ok(())
}

pub async fn ask(
    client: &ConversationClient,
    agent_id: &AgentId,
    conversation_id: Option<&ConversationId>,
    text: &str,
) -> Result<(), MurmurError> {
    let reply = client.ask(agent_id, conversation_id, text).await?;
    println!("{}", reply.answer);
    eprintln!("(conversation {}, layer {})", reply.conversation_id, reply.layer_used);
    Ok(())
}

pub(crate) fn summary_line(row: &ConversationSummary) -> String {
    let mut line = format!("{:<24} {}", row.id.as_str(), row.counterpart.display_name());
    if let Some(handle) = row.counterpart.handle() {
        line.push_str(&format!(" @{handle}"));
    }
    if row.unread_count > 0 {
        line.push_str(&format!(" [{} unread]", row.unread_count));
    }
    if let Some(entry) = &row.escalation {
        line.push_str(&format!(" <{} {}>", entry.id, entry.status));
    }
    if let Some(preview) = &row.preview {
        line.push_str(&format!("  {preview}"));
    }
    line
}

fn message_line(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.created_at().format("%Y-%m-%d %H:%M"),
        message.role(),
        message.content()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_directory::Counterpart;

    #[test]
    fn summary_line_shows_handle_unread_and_preview() {
        let row = ConversationSummary {
            id: ConversationId::from("c1"),
            category: ConversationCategory::DirectChat,
            counterpart: Counterpart::Person {
                display_name: "Pat".into(),
                handle: Some("pat".into()),
            },
            last_message_at: None,
            preview: Some("see you".into()),
            unread_count: 2,
            escalation: None,
        };
        let line = summary_line(&row);
        assert!(line.starts_with("c1"));
        assert!(line.contains("Pat @pat [2 unread]  see you"));
    }
}
