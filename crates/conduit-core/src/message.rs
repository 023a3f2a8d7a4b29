//! Conversation message types.
//!
//! Messages carry a `role` tag when serialized so a recorded trajectory can be
//! exported as-is to transcript consumers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Current time as an RFC 3339 timestamp, used to stamp messages.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Which side of the conversation issued a tool call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requestor {
    /// The agent issued the call.
    #[default]
    Assistant,
    /// The simulated user issued the call.
    User,
}

/// A single tool invocation requested by the model or synthesized by the tracer.
///
/// Fields are private so a call cannot change after it has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    id: String,
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
    #[serde(default)]
    requestor: Requestor,
}

impl ToolCall {
    /// Creates a call with a fresh random id.
    pub fn new<T: Into<String>>(name: T, arguments: Map<String, Value>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, arguments)
    }

    /// Creates a call with a caller-supplied id (e.g. the provider's call id).
    pub fn with_id<I: Into<String>, T: Into<String>>(
        id: I,
        name: T,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            requestor: Requestor::default(),
        }
    }

    /// Returns a copy of this call attributed to `requestor`.
    #[must_use]
    pub fn requested_by(mut self, requestor: Requestor) -> Self {
        self.requestor = requestor;
        self
    }

    /// Unique identifier of this call.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the invoked tool or function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyword arguments of the call.
    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    /// Who issued the call.
    pub fn requestor(&self) -> Requestor {
        self.requestor
    }
}

/// Response to exactly one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Id of the call this message answers.
    pub id: String,
    /// Serialized result, typically JSON.
    pub content: String,
    /// Whether the underlying invocation failed.
    #[serde(default)]
    pub error: bool,
    /// When the invocation started or the message was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Requestor copied from the answered call.
    #[serde(default)]
    pub requestor: Requestor,
}

impl ToolMessage {
    /// Creates a successful response for the call with `id`.
    pub fn success<I: Into<String>, T: Into<String>>(id: I, content: T) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            error: false,
            timestamp: None,
            requestor: Requestor::default(),
        }
    }

    /// Creates an error-flagged response for the call with `id`.
    pub fn failure<I: Into<String>, T: Into<String>>(id: I, content: T) -> Self {
        Self {
            error: true,
            ..Self::success(id, content)
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp<T: Into<String>>(mut self, timestamp: T) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the requestor.
    #[must_use]
    pub fn with_requestor(mut self, requestor: Requestor) -> Self {
        self.requestor = requestor;
        self
    }
}

/// Several tool responses returned to the model as one message.
///
/// Only used when a single model turn issued more than one call; order matches
/// the order of the calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiToolMessage {
    /// Per-call responses in call order.
    pub tool_messages: Vec<ToolMessage>,
}

impl MultiToolMessage {
    /// Wraps the given responses.
    pub fn new(tool_messages: Vec<ToolMessage>) -> Self {
        Self { tool_messages }
    }

    /// Number of packaged responses.
    pub fn len(&self) -> usize {
        self.tool_messages.len()
    }

    /// Whether no responses are packaged.
    pub fn is_empty(&self) -> bool {
        self.tool_messages.is_empty()
    }

    /// Re-expands into the individual responses.
    pub fn into_messages(self) -> Vec<ToolMessage> {
        self.tool_messages
    }
}

/// A reply produced by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Free-text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Requested tool calls; empty for a terminal reply.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AssistantMessage {
    /// Creates a terminal text reply.
    pub fn text<T: Into<String>>(content: T) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            timestamp: Some(now_timestamp()),
        }
    }

    /// Creates a reply requesting the given tool calls.
    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls,
            timestamp: Some(now_timestamp()),
        }
    }

    /// Whether the reply requests at least one tool call.
    pub fn is_tool_call(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Copy of this reply listing `recorded` instead of the original calls.
    ///
    /// Used to persist every call actually recorded for a turn, nested ones included.
    #[must_use]
    pub fn expanded(&self, recorded: Vec<ToolCall>) -> Self {
        Self {
            content: self.content.clone(),
            tool_calls: recorded,
            timestamp: self.timestamp.clone(),
        }
    }
}

/// A user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Message text.
    pub content: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl UserMessage {
    /// Creates a user message stamped with the current time.
    pub fn new<T: Into<String>>(content: T) -> Self {
        Self {
            content: content.into(),
            timestamp: Some(now_timestamp()),
        }
    }
}

/// System instructions given to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Prompt text.
    pub content: String,
}

impl SystemMessage {
    /// Creates a system message.
    pub fn new<T: Into<String>>(content: T) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Any message that can appear in a conversation or trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System instructions.
    System(SystemMessage),
    /// User turn.
    User(UserMessage),
    /// Model reply.
    Assistant(AssistantMessage),
    /// Single tool response.
    Tool(ToolMessage),
    /// Packaged tool responses.
    MultiTool(MultiToolMessage),
}

impl Message {
    /// Tool calls carried by this message, if it is an assistant reply.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant(assistant) => &assistant.tool_calls,
            Self::System(_) | Self::User(_) | Self::Tool(_) | Self::MultiTool(_) => &[],
        }
    }

    /// Tool responses carried by this message, expanding packaged ones.
    pub fn tool_messages(&self) -> Vec<&ToolMessage> {
        match self {
            Self::Tool(tool) => vec![tool],
            Self::MultiTool(multi) => multi.tool_messages.iter().collect(),
            Self::System(_) | Self::User(_) | Self::Assistant(_) => Vec::new(),
        }
    }
}

/// Messages the agent accepts as the input of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentInput {
    /// User turn.
    User(UserMessage),
    /// Response to a single tool call.
    Tool(ToolMessage),
    /// Responses to several tool calls from one reply.
    MultiTool(MultiToolMessage),
}

impl AgentInput {
    /// Packages meta-level responses: one response passes through, several are wrapped.
    ///
    /// Returns `None` when there is nothing to package.
    pub fn from_tool_messages(mut tool_messages: Vec<ToolMessage>) -> Option<Self> {
        if tool_messages.len() > 1 {
            Some(Self::MultiTool(MultiToolMessage::new(tool_messages)))
        } else {
            tool_messages.pop().map(Self::Tool)
        }
    }
}

impl From<UserMessage> for AgentInput {
    fn from(message: UserMessage) -> Self {
        Self::User(message)
    }
}

impl From<ToolMessage> for AgentInput {
    fn from(message: ToolMessage) -> Self {
        Self::Tool(message)
    }
}

impl From<MultiToolMessage> for AgentInput {
    fn from(message: MultiToolMessage) -> Self {
        Self::MultiTool(message)
    }
}

impl From<AgentInput> for Message {
    fn from(input: AgentInput) -> Self {
        match input {
            AgentInput::User(user) => Self::User(user),
            AgentInput::Tool(tool) => Self::Tool(tool),
            AgentInput::MultiTool(multi) => Self::MultiTool(multi),
        }
    }
}
