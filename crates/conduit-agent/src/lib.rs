//! Code-mode agent orchestration.
//!
//! The model never calls domain functions directly. It gets a small set of
//! meta-tools that inspect the available functions and run code against a remote
//! execution backend; that code calls the domain functions, and every such nested
//! call is traced and recorded next to the meta-tool call that caused it.
//!
//! # Architecture
//!
//! - [`bridge`]: private current-thread runtime the synchronous loop blocks on
//! - [`meta_tools`]: per-mode meta-tool surface with typed argument parsing
//! - [`orchestrator`]: the tool-calling loop and its trace draining
//! - [`trajectory`]: append-only record of expanded tool rounds
//! - [`agent`]: the facade bundling all of the above for one session
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use conduit_agent::{AgentState, CodeModeAgent, ConversationModel, MetaToolDescriptor};
//! use conduit_core::{AgentConfig, AgentInput, AssistantMessage, Result, UserMessage};
//! use conduit_tooling::{DomainEnvironment, ExecutionBackend};
//!
//! struct EchoModel;
//!
//! impl ConversationModel for EchoModel {
//!     fn generate(
//!         &self,
//!         _tools: &[MetaToolDescriptor],
//!         _message: AgentInput,
//!         state: AgentState,
//!     ) -> Result<(AssistantMessage, AgentState)> {
//!         Ok((AssistantMessage::text("Hello!"), state))
//!     }
//! }
//!
//! fn run<B: ExecutionBackend>(backend: B) -> Result<()> {
//!     let environment = Arc::new(DomainEnvironment::new("airline", "Be polite."));
//!     let mut agent = CodeModeAgent::new(environment, EchoModel, backend, AgentConfig::default())?;
//!     agent.connect()?;
//!
//!     let state = agent.init_state(Vec::new());
//!     let (reply, _state) = agent.generate_next_message(UserMessage::new("hi").into(), state)?;
//!     assert_eq!(reply.content.as_deref(), Some("Hello!"));
//!
//!     agent.shutdown();
//!     Ok(())
//! }
//! ```
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Allow for tests"
    )
)]

/// Agent facade
pub mod agent;
/// Sync/async execution bridge
pub mod bridge;
/// Tracing subscriber setup
pub mod logging;
/// Meta-tool surface and dispatch
pub mod meta_tools;
/// Base conversational model interface
pub mod model;
/// Conversation orchestration loop
pub mod orchestrator;
/// System prompt assembly
pub mod prompt;
/// Trajectory store
pub mod trajectory;

pub use agent::CodeModeAgent;
pub use bridge::ExecutionBridge;
pub use logging::{DEFAULT_DIRECTIVE, init_logging};
pub use meta_tools::{
    MetaTool, MetaToolDescriptor, MetaToolRequest, MetaToolRunner, MetaToolSurface,
};
pub use model::{AgentState, ConversationModel};
pub use orchestrator::{Orchestrator, ToolDispatcher, TurnPhase};
pub use prompt::build_system_prompt;
pub use trajectory::Trajectory;
