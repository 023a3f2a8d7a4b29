//! Core types for the code-mode agent.
//!
//! This crate provides the conversation data model, error handling, configuration
//! and prompt templates shared by the tooling and agent crates.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Allow for tests"
    )
)]

/// Agent configuration and the operating mode switch.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Conversation messages, tool calls and tool responses.
pub mod message;
/// Prompt templates embedded at compile time.
pub mod prompts;

pub use config::{AgentConfig, MODE_ENV_VAR, ToolMode};
pub use error::{Error, Result};
pub use message::{
    AgentInput, AssistantMessage, Message, MultiToolMessage, Requestor, SystemMessage, ToolCall,
    ToolMessage, UserMessage, now_timestamp,
};
pub use prompts::load_prompt;
