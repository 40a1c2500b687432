// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur chat` command implementation.
//!
//! Sends one message and prints the reply to stdout as it streams in.
//! Ctrl+C cancels the reply; the message text is printed back so nothing
//! typed is lost.

use std::io::Write;
use std::time::Duration;

use murmur_client::{ConversationClient, SendOutcome};
use murmur_core::{ConversationId, MessageId, MurmurError};
use tracing::debug;

/// How often the streaming reply is polled for new text.
const REDRAW_INTERVAL: Duration = Duration::from_millis(25);

pub async fn run(
    client: &ConversationClient,
    conversation_id: &ConversationId,
    text: &str,
) -> Result<(), MurmurError> {
    if let Err(e) = client.load_history(conversation_id).await {
        debug!(error = %e, "history not loaded before send");
    }
    client.set_draft(conversation_id, text);
    let handle = client.send(conversation_id)?;
    let reply = handle.reply_message().clone();

    let mut printed = 0;
    let mut canceled = false;
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !handle.is_finished() {
        tokio::select! {
            _ = &mut ctrl_c, if !canceled => {
                handle.cancel();
                canceled = true;
            }
            _ = redraw.tick() => {
                printed = print_new_text(client, conversation_id, &reply, printed);
            }
        }
    }

    match handle.wait().await {
        Ok(SendOutcome { content, .. }) => {
            print_tail(&content, printed);
            println!();
            Ok(())
        }
        Err(MurmurError::Canceled) => {
            println!();
            eprintln!("Reply canceled.");
            let draft = client.draft(conversation_id);
            if !draft.is_empty() {
                eprintln!("Your message was not sent: {draft}");
            }
            Ok(())
        }
        Err(e) => {
            println!();
            let draft = client.draft(conversation_id);
            if !draft.is_empty() {
                eprintln!("Your message was not sent: {draft}");
            }
            Err(e)
        }
    }
}

/// Prints whatever the reply gained since the last redraw. Returns the new printed length.
fn print_new_text(
    client: &ConversationClient,
    conversation_id: &ConversationId,
    reply: &MessageId,
    printed: usize,
) -> usize {
    let messages = client.messages(conversation_id);
    let Some(message) = messages.iter().find(|m| m.id() == reply) else {
        return printed;
    };
    print_tail(message.content(), printed)
}

fn print_tail(content: &str, printed: usize) -> usize {
    if let Some(tail) = content.get(printed..)
        && !tail.is_empty()
    {
        print!("{tail}");
        let _ = std::io::stdout().flush();
    }
    content.len().max(printed)
}
