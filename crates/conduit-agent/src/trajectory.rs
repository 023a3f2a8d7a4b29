//! Trajectory store.
//!
//! Append-only record of every message produced while resolving tool calls,
//! including the tool calls synthesized from nested domain invocations. The final
//! reply of a turn is never recorded here; the caller's own history owns it.

use std::collections::HashMap;

use conduit_core::{Message, Result};
use serde_json::to_string_pretty;

/// Ordered log of one session's expanded messages
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    messages: Vec<Message>,
}

impl Trajectory {
    /// Creates an empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends messages in order
    pub fn extend<I: IntoIterator<Item = Message>>(&mut self, messages: I) {
        self.messages.extend(messages);
    }

    /// Recorded messages in order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the recorded messages
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Number of recorded messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates over the recorded messages
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Whether every recorded tool call has exactly one matching tool response and
    /// every tool response answers a recorded call
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let mut outstanding: HashMap<&str, i64> = HashMap::new();
        for message in &self.messages {
            for call in message.tool_calls() {
                *outstanding.entry(call.id()).or_default() += 1;
            }
            for response in message.tool_messages() {
                *outstanding.entry(response.id.as_str()).or_default() -= 1;
            }
        }
        outstanding.values().all(|count| *count == 0)
    }

    /// Serializes the snapshot as pretty JSON
    ///
    /// # Errors
    /// Returns an error if a message cannot be serialized
    pub fn to_json(&self) -> Result<String> {
        Ok(to_string_pretty(&self.messages)?)
    }
}

impl<'trajectory> IntoIterator for &'trajectory Trajectory {
    type Item = &'trajectory Message;
    type IntoIter = core::slice::Iter<'trajectory, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
