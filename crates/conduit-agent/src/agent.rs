//! Code-mode agent facade.
//!
//! Ties the pieces together for one session: the environment's functions are traced
//! and registered with the backend, the meta-tool surface is built for the configured
//! mode, and every turn runs through the orchestrator on the agent's private bridge.

use std::sync::Arc;

use conduit_core::{AgentConfig, AgentInput, AssistantMessage, Error, Message, Result, ToolMode};
use conduit_tooling::{Environment, ExecutionBackend, TraceBuffer, Tracer};

use crate::bridge::ExecutionBridge;
use crate::meta_tools::{MetaToolDescriptor, MetaToolRunner, MetaToolSurface};
use crate::model::{AgentState, ConversationModel};
use crate::orchestrator::Orchestrator;
use crate::prompt::build_system_prompt;
use crate::trajectory::Trajectory;

/// An agent that reaches domain functions only through code executed remotely.
pub struct CodeModeAgent<M: ConversationModel, B: ExecutionBackend> {
    environment: Arc<dyn Environment>,
    model: M,
    backend: B,
    bridge: ExecutionBridge,
    surface: MetaToolSurface,
    orchestrator: Orchestrator,
    system_prompt: String,
    config: AgentConfig,
}

impl<M: ConversationModel, B: ExecutionBackend> CodeModeAgent<M, B> {
    /// Creates an agent for `environment`.
    ///
    /// Every environment function is wrapped by a tracer and registered with
    /// `backend` under the environment's domain name.
    ///
    /// # Errors
    /// Returns an error if the prompt cannot be built or the bridge cannot start
    pub fn new(
        environment: Arc<dyn Environment>,
        model: M,
        mut backend: B,
        config: AgentConfig,
    ) -> Result<Self> {
        let buffer = TraceBuffer::new();
        let serializer_env = Arc::clone(&environment);
        let tracer = Tracer::new(buffer.clone())
            .with_serializer(move |value| serializer_env.to_json_str(value));

        let traced = tracer.wrap_registry(&environment.functions());
        tracing::debug!(
            namespace = environment.domain_name(),
            functions = traced.len(),
            "registering traced functions"
        );
        backend.register_functions(environment.domain_name(), traced);

        let system_prompt = build_system_prompt(environment.as_ref(), config.mode)?;
        let surface = MetaToolSurface::build(config.mode);
        let bridge = ExecutionBridge::new()?;
        let orchestrator = Orchestrator::new(buffer, &config);

        Ok(Self {
            environment,
            model,
            backend,
            bridge,
            surface,
            orchestrator,
            system_prompt,
            config,
        })
    }

    /// Creates an agent whose mode is read from `CONDUIT_MODE`.
    ///
    /// # Errors
    /// Returns an error if the variable holds an unknown mode, or as [`Self::new`]
    pub fn from_env(environment: Arc<dyn Environment>, model: M, backend: B) -> Result<Self> {
        Self::new(environment, model, backend, AgentConfig::from_env()?)
    }

    /// Full system prompt, policy included.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Meta-tools advertised to the model.
    #[must_use]
    pub fn tools(&self) -> &[MetaToolDescriptor] {
        self.surface.descriptors()
    }

    /// Active operating mode.
    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.surface.mode()
    }

    /// Configuration the agent was built with.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Environment the agent serves.
    #[must_use]
    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    /// Execution backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Initial state: the system prompt followed by `history`.
    #[must_use]
    pub fn init_state(&self, history: Vec<Message>) -> AgentState {
        AgentState::new(self.system_prompt.clone(), history)
    }

    /// Opens the backend session.
    ///
    /// # Errors
    /// Returns the backend or bridge error
    pub fn connect(&mut self) -> Result<()> {
        let backend = &mut self.backend;
        self.bridge
            .run(async move { backend.connect().await.map_err(Error::from) })?;
        tracing::info!(session = ?self.backend.session_id(), "connected to execution server");
        Ok(())
    }

    /// Closes the backend session.
    ///
    /// # Errors
    /// Returns the backend or bridge error
    pub fn disconnect(&mut self) -> Result<()> {
        let session = self.backend.session_id();
        let backend = &mut self.backend;
        self.bridge
            .run(async move { backend.disconnect().await.map_err(Error::from) })?;
        tracing::info!(?session, "disconnected from execution server");
        Ok(())
    }

    /// Runs one turn: feeds `message` to the model and resolves tool calls until it
    /// replies without any.
    ///
    /// # Errors
    /// Returns model, bridge and backend errors, or `Error::IterationLimit` when a
    /// configured round budget is exhausted
    pub fn generate_next_message(
        &mut self,
        message: AgentInput,
        state: AgentState,
    ) -> Result<(AssistantMessage, AgentState)> {
        let runner = MetaToolRunner::new(&self.surface, &self.bridge, &self.backend);
        self.orchestrator.run(&self.model, &runner, message, state)
    }

    /// Snapshot of every message recorded while resolving tool calls.
    #[must_use]
    pub fn internal_messages(&self) -> Vec<Message> {
        self.orchestrator.trajectory().snapshot()
    }

    /// Recorded trajectory.
    #[must_use]
    pub fn trajectory(&self) -> &Trajectory {
        self.orchestrator.trajectory()
    }

    /// Whether the agent has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.bridge.is_closed()
    }

    /// Disconnects an open session and closes the bridge.
    ///
    /// Returns `true` only for the call that closed the bridge; later calls do nothing.
    pub fn shutdown(&mut self) -> bool {
        if self.bridge.is_closed() {
            return false;
        }

        let disconnected = if self.backend.session_id().is_some() {
            self.disconnect()
        } else {
            Ok(())
        };
        if let Err(err) = disconnected {
            tracing::warn!(%err, "failed to disconnect during shutdown");
        }

        let closed = self.bridge.shutdown();
        tracing::debug!(closed, "agent shut down");
        closed
    }
}

impl<M: ConversationModel, B: ExecutionBackend> Drop for CodeModeAgent<M, B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
