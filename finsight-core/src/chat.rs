//! Chat messages and the per-message streaming state machine.
//!
//! A model reply starts as `Pending`, moves to `Streaming` on the first
//! chunk, and ends `Complete` or `Failed`. `apply_chat_event` is a total
//! function of (current list, message id, event) so the view never mutates
//! a message in place.

use serde::{Deserialize, Serialize};

/// Shown when a call was throttled by the remote service.
pub const RATE_LIMIT_MESSAGE: &str =
    "The assistant is handling too many requests right now. Try again in a minute.";

/// Shown for any other remote failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong reaching the assistant. Try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageState {
    Pending,
    Streaming,
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub state: MessageState,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            state: MessageState::Complete,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Placeholder for a model reply that has not produced text yet.
    pub fn pending_model(id: u64) -> Self {
        Self {
            id,
            role: Role::Model,
            text: String::new(),
            state: MessageState::Pending,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Events a single streaming request can emit for its message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    Started,
    Delta(String),
    Completed,
    Failed { rate_limited: bool },
}

/// Fold one event into the message list, returning the new list.
///
/// Events addressed to an id that is not in the list, or to a message that
/// already reached a terminal state, leave the list unchanged.
pub fn apply_chat_event(
    messages: &[ChatMessage],
    id: u64,
    event: &ChatStreamEvent,
) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| {
            if m.id != id || matches!(m.state, MessageState::Complete | MessageState::Failed) {
                return m.clone();
            }
            let mut next = m.clone();
            match event {
                ChatStreamEvent::Started => {}
                ChatStreamEvent::Delta(chunk) => {
                    if next.state == MessageState::Pending {
                        next.state = MessageState::Streaming;
                        next.text = chunk.clone();
                    } else {
                        next.text.push_str(chunk);
                    }
                }
                ChatStreamEvent::Completed => {
                    next.state = MessageState::Complete;
                }
                ChatStreamEvent::Failed { rate_limited } => {
                    next.state = MessageState::Failed;
                    // A partially-streamed reply keeps its text; an empty
                    // placeholder is replaced with the classified message.
                    if next.text.is_empty() {
                        next.text = if *rate_limited {
                            RATE_LIMIT_MESSAGE.to_string()
                        } else {
                            GENERIC_FAILURE_MESSAGE.to_string()
                        };
                    }
                }
            }
            next
        })
        .collect()
}
