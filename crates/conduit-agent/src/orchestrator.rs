//! Conversation orchestration loop.
//!
//! Drives the base model until it produces a reply without tool calls. Every tool
//! round is dispatched in call order; nested domain calls captured by the tracer
//! during a dispatch are recorded right after the meta-level call that caused them.

use conduit_core::{
    AgentConfig, AgentInput, AssistantMessage, Error, Message, Result, ToolCall, ToolMessage,
    now_timestamp,
};
use conduit_tooling::TraceBuffer;
use serde_json::Value;

use crate::meta_tools::MetaToolDescriptor;
use crate::model::{AgentState, ConversationModel};
use crate::trajectory::Trajectory;

/// Where the loop currently is within a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting on the base model
    #[default]
    AwaitingModel,
    /// Executing the tool calls of the latest reply
    DispatchingTools,
    /// The turn has ended
    Terminal,
}

/// Resolves and runs a meta-level tool call.
pub trait ToolDispatcher {
    /// Tools advertised to the model.
    fn descriptors(&self) -> &[MetaToolDescriptor];

    /// Runs `call` and returns its rendered response.
    ///
    /// # Errors
    /// Recoverable errors (see [`Error::is_recoverable`]) are reported back to the
    /// model; any other error ends the turn
    fn dispatch(&self, call: &ToolCall) -> Result<String>;
}

/// Everything one tool round produced
#[derive(Default)]
struct Round {
    /// Meta calls, each followed by its nested calls
    calls: Vec<ToolCall>,
    /// Responses in the same order as `calls`
    responses: Vec<ToolMessage>,
    /// Meta-level responses only, in call order
    replies: Vec<ToolMessage>,
}

/// Sequential tool-calling loop owning the trace buffer and the trajectory.
#[derive(Debug)]
pub struct Orchestrator {
    buffer: TraceBuffer,
    trajectory: Trajectory,
    nested_call_warning: usize,
    max_tool_iterations: Option<usize>,
    phase: TurnPhase,
}

impl Orchestrator {
    /// Creates a loop draining `buffer`, with thresholds taken from `config`.
    #[must_use]
    pub fn new(buffer: TraceBuffer, config: &AgentConfig) -> Self {
        Self {
            buffer,
            trajectory: Trajectory::new(),
            nested_call_warning: config.nested_call_warning,
            max_tool_iterations: config.max_tool_iterations,
            phase: TurnPhase::default(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Messages recorded so far.
    #[must_use]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Trace buffer drained after each dispatch.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Runs one turn to completion.
    ///
    /// Returns the terminal reply, which is not recorded in the trajectory, along
    /// with the model's final state.
    ///
    /// # Errors
    /// Returns model, bridge and backend errors unchanged, or
    /// `Error::IterationLimit` when a configured round budget is exhausted
    pub fn run<M, D>(
        &mut self,
        model: &M,
        dispatcher: &D,
        message: AgentInput,
        state: AgentState,
    ) -> Result<(AssistantMessage, AgentState)>
    where
        M: ConversationModel + ?Sized,
        D: ToolDispatcher + ?Sized,
    {
        let outcome = self.drive(model, dispatcher, message, state);
        self.phase = TurnPhase::Terminal;
        outcome
    }

    fn drive<M, D>(
        &mut self,
        model: &M,
        dispatcher: &D,
        mut message: AgentInput,
        mut state: AgentState,
    ) -> Result<(AssistantMessage, AgentState)>
    where
        M: ConversationModel + ?Sized,
        D: ToolDispatcher + ?Sized,
    {
        let mut rounds = 0_usize;

        loop {
            self.phase = TurnPhase::AwaitingModel;
            let (reply, next_state) = model.generate(dispatcher.descriptors(), message, state)?;
            state = next_state;

            if !reply.is_tool_call() {
                tracing::debug!(rounds, "turn complete");
                return Ok((reply, state));
            }

            if let Some(limit) = self.max_tool_iterations.filter(|limit| rounds >= *limit) {
                tracing::warn!(limit, "tool round budget exhausted");
                return Err(Error::IterationLimit(limit));
            }

            self.phase = TurnPhase::DispatchingTools;
            rounds += 1;
            tracing::debug!(
                iteration = rounds,
                calls = reply.tool_calls.len(),
                "dispatching tool calls"
            );

            let round = self.dispatch_round(dispatcher, &reply.tool_calls)?;
            self.trajectory
                .push(Message::Assistant(reply.expanded(round.calls)));
            self.trajectory
                .extend(round.responses.into_iter().map(Message::Tool));

            let packaged = round.replies.len();
            message = AgentInput::from_tool_messages(round.replies)
                .ok_or_else(|| Error::Other("Tool round produced no responses".to_owned()))?;
            tracing::debug!(responses = packaged, "returning tool responses to model");
        }
    }

    fn dispatch_round<D>(&self, dispatcher: &D, calls: &[ToolCall]) -> Result<Round>
    where
        D: ToolDispatcher + ?Sized,
    {
        let mut round = Round::default();

        for call in calls {
            self.buffer.clear();
            let timestamp = now_timestamp();
            let outcome = dispatcher.dispatch(call);
            let nested = self.buffer.drain();

            let response = match outcome {
                Ok(text) => ToolMessage::success(call.id(), Value::String(text).to_string()),
                Err(err) if err.is_recoverable() => {
                    tracing::debug!(tool = call.name(), %err, "meta-tool call rejected");
                    ToolMessage::failure(call.id(), Value::String(format!("Error: {err}")).to_string())
                }
                Err(err) => return Err(err),
            }
            .with_timestamp(timestamp)
            .with_requestor(call.requestor());

            if nested.len() > self.nested_call_warning {
                tracing::warn!(
                    tool = call.name(),
                    nested = nested.len(),
                    threshold = self.nested_call_warning,
                    "meta-tool call made an unusually large number of nested calls"
                );
            }

            round.calls.push(call.clone());
            round.responses.push(response.clone());
            round.replies.push(response);
            // Nested calls are attributed to whoever issued the meta call
            for traced in nested {
                round.calls.push(traced.call.requested_by(call.requestor()));
                round
                    .responses
                    .push(traced.response.with_requestor(call.requestor()));
            }
        }

        Ok(round)
    }
}
