//! Conversation transcript shared by both backends.

use llm::{Message, Role};

/// Ordered conversation history for one session.
///
/// Append-only. User turns are pushed when a turn starts; everything the
/// assistant produced in a turn is committed in one batch after the turn
/// completes, so a failed or abandoned stream leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append a completed assistant turn: its tool calls, their results
    /// and the final answer.
    pub(crate) fn commit(&mut self, turn: Vec<Message>) {
        debug_assert!(
            turn.iter()
                .all(|m| matches!(m.role, Role::Assistant | Role::Tool)),
            "only assistant output may be committed"
        );
        self.messages.extend(turn);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
