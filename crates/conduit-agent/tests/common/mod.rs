//! Shared mocks for conduit-agent integration tests
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conduit_agent::{AgentState, CodeModeAgent, ConversationModel, MetaToolDescriptor};
use conduit_core::{
    AgentConfig, AgentInput, AssistantMessage, Error, Message, Result, ToolCall, ToolMode,
};
use conduit_tooling::{
    BackendError, BackendResult, DomainEnvironment, ExecutionBackend, ExecutionReport,
    FnFunction, FunctionArgs, FunctionError, FunctionListing, FunctionRegistry, FunctionResult,
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Reservation id the cancel function refuses
pub const LOCKED_RESERVATION: &str = "LOCKED1";

/// Code snippet the backend treats as an unreachable server
pub const UNREACHABLE_CODE: &str = "throw new ServerGone()";

/// Builds an object argument map
pub fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object arguments, got {other}"),
    }
}

/// Model call with a fixed id
pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall::with_id(id, name, args(arguments))
}

/// Reply requesting `calls`
pub fn tool_reply(calls: Vec<ToolCall>) -> AssistantMessage {
    AssistantMessage::with_tool_calls(None, calls)
}

/// What the scripted model saw on each `generate`
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub tools: Vec<&'static str>,
    pub input: AgentInput,
    pub system_prompt: Option<String>,
}

/// Model replaying a fixed list of replies
///
/// Clones share the script and the request log, so a test can keep one handle after
/// moving another into the agent.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<AssistantMessage>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<AssistantMessage>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl ConversationModel for ScriptedModel {
    fn generate(
        &self,
        tools: &[MetaToolDescriptor],
        message: AgentInput,
        mut state: AgentState,
    ) -> Result<(AssistantMessage, AgentState)> {
        self.requests.lock().unwrap().push(ModelRequest {
            tools: tools.iter().map(MetaToolDescriptor::name).collect(),
            input: message.clone(),
            system_prompt: state.system_messages.first().map(|system| system.content.clone()),
        });

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Model("script exhausted".to_owned()))?;

        state.messages.push(Message::from(message));
        state.messages.push(Message::Assistant(reply.clone()));
        Ok((reply, state))
    }
}

/// Sandbox stand-in that runs "programs": each known snippet maps to a list of
/// domain calls made through the registered functions, in order
#[derive(Default)]
pub struct ScriptedBackend {
    namespace: String,
    functions: FunctionRegistry,
    programs: HashMap<String, Vec<(String, Value)>>,
    session: Option<String>,
    pub connects: usize,
    pub disconnects: usize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a snippet calling `calls` in order
    #[must_use]
    pub fn with_program(mut self, code: &str, calls: Vec<(&str, Value)>) -> Self {
        let calls = calls
            .into_iter()
            .map(|(name, arguments)| (name.to_owned(), arguments))
            .collect();
        self.programs.insert(code.to_owned(), calls);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn registered(&self) -> &FunctionRegistry {
        &self.functions
    }

    fn declaration(name: &str) -> String {
        format!("  function {name}(args: object): Promise<unknown>;")
    }

    fn run_program(&self, code: &str) -> ExecutionReport {
        let Some(calls) = self.programs.get(code) else {
            return ExecutionReport::failed(format!("SyntaxError: unexpected input `{code}`"));
        };

        let mut results = Vec::new();
        for (name, arguments) in calls {
            let Some(function) = self.functions.get(name) else {
                return ExecutionReport::failed(format!(
                    "ReferenceError: {}.{name} is not defined",
                    self.namespace
                ));
            };
            let Value::Object(map) = arguments else {
                return ExecutionReport::failed("TypeError: arguments must be an object");
            };
            match function.call(map) {
                Ok(value) => results.push(value),
                Err(err) => return ExecutionReport::failed(err.to_string()),
            }
        }

        ExecutionReport::succeeded(Some(Value::Array(results)))
            .with_stdout(format!("{} call(s) made", calls.len()))
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    fn register_functions(&mut self, namespace: &str, functions: FunctionRegistry) {
        namespace.clone_into(&mut self.namespace);
        self.functions = functions;
    }

    async fn connect(&mut self) -> BackendResult<()> {
        self.connects += 1;
        self.session = Some(Uuid::new_v4().to_string());
        Ok(())
    }

    async fn disconnect(&mut self) -> BackendResult<()> {
        self.disconnects += 1;
        self.session = None;
        Ok(())
    }

    fn session_id(&self) -> Option<String> {
        self.session.clone()
    }

    async fn list_functions(&self) -> BackendResult<FunctionListing> {
        self.require_session()?;
        let body: Vec<String> = self
            .functions
            .names()
            .iter()
            .map(|name| Self::declaration(name))
            .collect();
        Ok(FunctionListing::new(format!(
            "namespace {} {{\n{}\n}}",
            self.namespace,
            body.join("\n")
        )))
    }

    async fn get_function_details(&self, functions: &[String]) -> BackendResult<FunctionListing> {
        self.require_session()?;
        let details: Vec<String> = functions
            .iter()
            .filter_map(|qualified| {
                let name = qualified.rsplit('.').next().unwrap_or(qualified);
                self.functions
                    .get(name)
                    .map(|function| format!("/** {} */\n{}", function.description(), Self::declaration(name)))
            })
            .collect();
        Ok(FunctionListing::new(details.join("\n\n")))
    }

    async fn execute(&self, code: &str) -> BackendResult<ExecutionReport> {
        self.require_session()?;
        if code == UNREACHABLE_CODE {
            return Err(BackendError::Unavailable("connection refused".to_owned()));
        }
        Ok(self.run_program(code))
    }

    async fn execute_bash(&self, command: &str) -> BackendResult<ExecutionReport> {
        self.require_session()?;
        let stdout = match command.trim() {
            "ls" => self.namespace.clone(),
            listing if listing == format!("ls {}", self.namespace) => self
                .functions
                .names()
                .iter()
                .map(|name| format!("{name}.d.ts"))
                .collect::<Vec<_>>()
                .join("\n"),
            other => {
                return Ok(ExecutionReport::failed(format!("bash: {other}: command not found")));
            }
        };
        Ok(ExecutionReport::succeeded(None).with_stdout(stdout))
    }
}

impl ScriptedBackend {
    fn require_session(&self) -> BackendResult<()> {
        if self.session.is_some() {
            Ok(())
        } else {
            Err(BackendError::NotConnected)
        }
    }
}

/// Airline domain with three functions
///
/// `cancel_reservation` fails for [`LOCKED_RESERVATION`]; `get_user_name` returns a
/// bare string.
pub fn airline_environment() -> Arc<DomainEnvironment> {
    let registry = FunctionRegistry::new()
        .with_function(Arc::new(FnFunction::new(
            "get_reservation",
            "Look up a reservation by id",
            |arguments: &FunctionArgs| {
                let id = reservation_id(arguments)?;
                Ok(json!({ "reservation_id": id, "status": "confirmed", "cabin": "economy" }))
            },
        )))
        .with_function(Arc::new(FnFunction::new(
            "cancel_reservation",
            "Cancel a reservation",
            |arguments: &FunctionArgs| {
                let id = reservation_id(arguments)?;
                if id == LOCKED_RESERVATION {
                    return Err(FunctionError::ExecutionFailed(format!(
                        "Reservation {id} cannot be cancelled"
                    )));
                }
                Ok(json!({ "reservation_id": id, "status": "cancelled" }))
            },
        )))
        .with_function(Arc::new(FnFunction::new(
            "get_user_name",
            "Name of the signed-in user",
            |_: &FunctionArgs| Ok(json!("Ada Lovelace")),
        )));

    Arc::new(
        DomainEnvironment::new("airline", "Only cancel reservations made in the last 24 hours.")
            .with_functions(registry),
    )
}

fn reservation_id(arguments: &FunctionArgs) -> FunctionResult<String> {
    arguments
        .get("reservation_id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| FunctionError::InvalidInput("reservation_id is required".to_owned()))
}

/// Connected agent over the airline environment
pub fn connected_agent(
    mode: ToolMode,
    model: ScriptedModel,
    backend: ScriptedBackend,
) -> CodeModeAgent<ScriptedModel, ScriptedBackend> {
    let mut agent =
        CodeModeAgent::new(airline_environment(), model, backend, AgentConfig::with_mode(mode))
            .unwrap();
    agent.connect().unwrap();
    agent
}
