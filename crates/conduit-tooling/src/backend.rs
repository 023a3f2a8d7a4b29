//! Remote execution backend interface.
//!
//! The backend hosts the sandboxed interpreter. Code it executes calls back into
//! the domain functions registered with [`ExecutionBackend::register_functions`];
//! the agent only ever talks to it through its bridge.

use async_trait::async_trait;
use conduit_core::Error as CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, to_string_pretty};
use thiserror::Error;

use crate::FunctionRegistry;

/// Errors reported by an execution backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An operation was attempted before `connect` succeeded.
    #[error("Not connected to execution server")]
    NotConnected,

    /// The server could not be reached.
    #[error("Execution server unavailable: {0}")]
    Unavailable(String),

    /// The server answered with something unexpected.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<BackendError> for CoreError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Declarations returned by the discovery operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionListing {
    /// Declaration source (e.g. TypeScript namespaces with function signatures).
    pub code: String,
}

impl FunctionListing {
    /// Wraps declaration source.
    pub fn new<T: Into<String>>(code: T) -> Self {
        Self { code: code.into() }
    }
}

/// Outcome of running code or a shell command in the sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether the execution completed without an error.
    pub success: bool,
    /// Value returned by the executed code, if any.
    #[serde(default)]
    pub output: Option<Value>,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
}

impl ExecutionReport {
    /// Successful execution returning `output`.
    pub fn succeeded(output: Option<Value>) -> Self {
        Self {
            success: true,
            output,
            ..Self::default()
        }
    }

    /// Failed execution with `stderr`.
    pub fn failed<T: Into<String>>(stderr: T) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Sets captured standard output.
    #[must_use]
    pub fn with_stdout<T: Into<String>>(mut self, stdout: T) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Renders the report as markdown for the model.
    ///
    /// Empty sections are left out.
    pub fn markdown(&self) -> String {
        let mut rendered = format!("Code Executed Successfully: {}", self.success);

        if let Some(output) = &self.output {
            let pretty = to_string_pretty(output).unwrap_or_else(|_| output.to_string());
            rendered.push_str(&format!("\n\n# Return Value\n```json\n{pretty}\n```"));
        }
        if !self.stdout.trim().is_empty() {
            rendered.push_str(&format!("\n\n# STDOUT\n{}", self.stdout.trim_end()));
        }
        if !self.stderr.trim().is_empty() {
            rendered.push_str(&format!("\n\n# STDERR\n{}", self.stderr.trim_end()));
        }

        rendered
    }
}

/// Remote sandbox the meta-tools run against.
///
/// Operations are asynchronous; the agent serializes them onto its private
/// reactor, so implementations never see two calls in flight at once.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Makes `functions` callable from executed code under `namespace`.
    ///
    /// Called once, before `connect`.
    fn register_functions(&mut self, namespace: &str, functions: FunctionRegistry);

    /// Opens a session with the server.
    async fn connect(&mut self) -> BackendResult<()>;

    /// Closes the session.
    async fn disconnect(&mut self) -> BackendResult<()>;

    /// Identifier of the open session, if connected.
    fn session_id(&self) -> Option<String>;

    /// Lists every available function, grouped by namespace.
    async fn list_functions(&self) -> BackendResult<FunctionListing>;

    /// Detailed signatures for the named functions.
    async fn get_function_details(&self, functions: &[String]) -> BackendResult<FunctionListing>;

    /// Runs a code snippet that may call registered functions.
    async fn execute(&self, code: &str) -> BackendResult<ExecutionReport>;

    /// Runs a shell command for exploring the function tree.
    async fn execute_bash(&self, command: &str) -> BackendResult<ExecutionReport>;
}
