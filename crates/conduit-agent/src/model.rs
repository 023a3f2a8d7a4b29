//! Base conversational mechanism.

use conduit_core::{AgentInput, AssistantMessage, Message, Result, SystemMessage};
use serde::{Deserialize, Serialize};

use crate::meta_tools::MetaToolDescriptor;

/// Conversation state threaded through the base model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// System instructions, sent ahead of every request
    pub system_messages: Vec<SystemMessage>,
    /// Conversation history in order
    pub messages: Vec<Message>,
}

impl AgentState {
    /// State with one system prompt and prior history.
    pub fn new<T: Into<String>>(system_prompt: T, history: Vec<Message>) -> Self {
        Self {
            system_messages: vec![SystemMessage::new(system_prompt)],
            messages: history,
        }
    }
}

/// The LLM-backed agent the orchestrator drives.
///
/// Maps `(incoming message, state)` to `(reply, new state)`. Prompt construction,
/// provider calls, retries and timeouts all live behind this trait.
pub trait ConversationModel {
    /// Produces the next reply.
    ///
    /// `tools` is the meta-tool surface the reply may call.
    ///
    /// # Errors
    /// Returns an error if the model cannot produce a reply
    fn generate(
        &self,
        tools: &[MetaToolDescriptor],
        message: AgentInput,
        state: AgentState,
    ) -> Result<(AssistantMessage, AgentState)>;
}
