//! Meta-tool surface exposed to the model.
//!
//! The model never calls domain functions directly. Depending on [`ToolMode`] it gets
//! either the discovery trio (`list_functions`, `get_function_details`, `execute`) or
//! the filesystem pair (`execute_bash`, `execute_typescript`). The surface is a closed
//! set resolved once at construction; calls are parsed into typed requests before
//! anything reaches the backend.

use conduit_core::{Error, Result, ToolCall, ToolMode};
use conduit_tooling::ExecutionBackend;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, from_value, json};

use crate::bridge::ExecutionBridge;
use crate::orchestrator::ToolDispatcher;

/// Every meta-tool that can appear on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaTool {
    /// Enumerate functions grouped by namespace.
    ListFunctions,
    /// Fetch signatures for selected functions.
    GetFunctionDetails,
    /// Execute code that calls discovered functions.
    Execute,
    /// Run a shell command against the function tree.
    ExecuteBash,
    /// Execute code in filesystem mode.
    ExecuteTypescript,
}

impl MetaTool {
    /// Meta-tools available in `mode`, in advertised order.
    #[must_use]
    pub const fn for_mode(mode: ToolMode) -> &'static [Self] {
        match mode {
            ToolMode::Discovery => &[Self::ListFunctions, Self::GetFunctionDetails, Self::Execute],
            ToolMode::Filesystem => &[Self::ExecuteBash, Self::ExecuteTypescript],
        }
    }

    /// Name the model calls this tool by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListFunctions => "list_functions",
            Self::GetFunctionDetails => "get_function_details",
            Self::Execute => "execute",
            Self::ExecuteBash => "execute_bash",
            Self::ExecuteTypescript => "execute_typescript",
        }
    }

    /// Usage description shown to the model.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ListFunctions => {
                "List every function you can call from `execute`, grouped by namespace. \
                 Start here to see what is available."
            }
            Self::GetFunctionDetails => {
                "Get full signatures and documentation for specific functions. \
                 Pass qualified names such as `namespace.function_name`."
            }
            Self::Execute => {
                "Execute TypeScript code in a sandbox. Call discovered functions by qualified \
                 name (`await namespace.function_name({...})`) and `return` the values you need. \
                 Returns the return value together with stdout and stderr."
            }
            Self::ExecuteBash => {
                "Run a shell command to explore the function tree (`ls`, `cat`, `grep`). \
                 Each namespace is a directory and each function a declaration file."
            }
            Self::ExecuteTypescript => {
                "Execute TypeScript code in a sandbox. Call functions by qualified name \
                 (`await namespace.function_name({...})`) and `return` the values you need. \
                 Returns the return value together with stdout and stderr."
            }
        }
    }

    /// JSON schema of the tool's arguments.
    #[must_use]
    pub fn parameters(self) -> Value {
        match self {
            Self::ListFunctions => json!({ "type": "object", "properties": {} }),
            Self::GetFunctionDetails => json!({
                "type": "object",
                "properties": {
                    "functions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Qualified function names"
                    }
                },
                "required": ["functions"]
            }),
            Self::Execute | Self::ExecuteTypescript => json!({
                "type": "object",
                "properties": {
                    "code": { "type": "string", "description": "TypeScript source to run" }
                },
                "required": ["code"]
            }),
            Self::ExecuteBash => json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string", "description": "Shell command to run" }
                },
                "required": ["command"]
            }),
        }
    }

    /// Parses `call` into a typed request for this tool.
    ///
    /// # Errors
    /// Returns `Error::InvalidArguments` if the arguments do not match the schema
    pub fn parse(self, call: &ToolCall) -> Result<MetaToolRequest> {
        Ok(match self {
            Self::ListFunctions => {
                let NoArgs {} = self.parse_args(call)?;
                MetaToolRequest::ListFunctions
            }
            Self::GetFunctionDetails => {
                let DetailsArgs { functions } = self.parse_args(call)?;
                MetaToolRequest::GetFunctionDetails { functions }
            }
            Self::Execute => {
                let CodeArgs { code } = self.parse_args(call)?;
                MetaToolRequest::Execute { code }
            }
            Self::ExecuteBash => {
                let CommandArgs { command } = self.parse_args(call)?;
                MetaToolRequest::ExecuteBash { command }
            }
            Self::ExecuteTypescript => {
                let CodeArgs { code } = self.parse_args(call)?;
                MetaToolRequest::ExecuteTypescript { code }
            }
        })
    }

    fn parse_args<T: DeserializeOwned>(self, call: &ToolCall) -> Result<T> {
        from_value(Value::Object(call.arguments().clone())).map_err(|err| {
            Error::InvalidArguments {
                tool: self.name().to_owned(),
                reason: err.to_string(),
            }
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailsArgs {
    functions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CodeArgs {
    code: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandArgs {
    command: String,
}

/// A meta-tool call with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaToolRequest {
    /// `list_functions`
    ListFunctions,
    /// `get_function_details`
    GetFunctionDetails {
        /// Qualified function names.
        functions: Vec<String>,
    },
    /// `execute`
    Execute {
        /// Source to run.
        code: String,
    },
    /// `execute_bash`
    ExecuteBash {
        /// Command to run.
        command: String,
    },
    /// `execute_typescript`
    ExecuteTypescript {
        /// Source to run.
        code: String,
    },
}

impl MetaToolRequest {
    /// Runs the request against `backend` through `bridge` and renders the result.
    ///
    /// Listings render as their declaration code, executions as a markdown report.
    ///
    /// # Errors
    /// Returns the bridge or backend error; these are not recoverable
    pub fn run<B>(&self, bridge: &ExecutionBridge, backend: &B) -> Result<String>
    where
        B: ExecutionBackend + ?Sized,
    {
        match self {
            Self::ListFunctions => bridge
                .run(async { backend.list_functions().await.map_err(Error::from) })
                .map(|listing| listing.code),
            Self::GetFunctionDetails { functions } => bridge
                .run(async { backend.get_function_details(functions).await.map_err(Error::from) })
                .map(|listing| listing.code),
            Self::Execute { code } | Self::ExecuteTypescript { code } => bridge
                .run(async { backend.execute(code).await.map_err(Error::from) })
                .map(|report| report.markdown()),
            Self::ExecuteBash { command } => bridge
                .run(async { backend.execute_bash(command).await.map_err(Error::from) })
                .map(|report| report.markdown()),
        }
    }

    /// Short label used when logging the call.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::ListFunctions => String::new(),
            Self::GetFunctionDetails { functions } => functions.join(", "),
            Self::Execute { code } | Self::ExecuteTypescript { code } => code.clone(),
            Self::ExecuteBash { command } => command.clone(),
        }
    }
}

/// A meta-tool as advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaToolDescriptor {
    tool: MetaTool,
    parameters: Value,
}

impl MetaToolDescriptor {
    /// Describes `tool`.
    #[must_use]
    pub fn new(tool: MetaTool) -> Self {
        Self {
            tool,
            parameters: tool.parameters(),
        }
    }

    /// The described tool.
    #[must_use]
    pub fn tool(&self) -> MetaTool {
        self.tool
    }

    /// Advertised name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.tool.name()
    }

    /// Advertised description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.tool.description()
    }

    /// Argument schema.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Function-calling schema in the common `{"type": "function", ...}` shape.
    #[must_use]
    pub fn to_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters,
            }
        })
    }
}

/// Closed set of meta-tools for one operating mode.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaToolSurface {
    mode: ToolMode,
    descriptors: Vec<MetaToolDescriptor>,
}

impl MetaToolSurface {
    /// Builds the surface for `mode`.
    #[must_use]
    pub fn build(mode: ToolMode) -> Self {
        Self {
            mode,
            descriptors: MetaTool::for_mode(mode)
                .iter()
                .copied()
                .map(MetaToolDescriptor::new)
                .collect(),
        }
    }

    /// Mode the surface was built for.
    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Advertised tools in order.
    #[must_use]
    pub fn descriptors(&self) -> &[MetaToolDescriptor] {
        &self.descriptors
    }

    /// Advertised tool names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(MetaToolDescriptor::name).collect()
    }

    /// Resolves a model call against this surface.
    ///
    /// # Errors
    /// Returns `Error::UnknownTool` if the name is not on this surface, or
    /// `Error::InvalidArguments` if the arguments are malformed
    pub fn resolve(&self, call: &ToolCall) -> Result<MetaToolRequest> {
        let descriptor = self
            .descriptors
            .iter()
            .find(|descriptor| descriptor.name() == call.name())
            .ok_or_else(|| Error::UnknownTool(call.name().to_owned()))?;
        descriptor.tool().parse(call)
    }
}

/// Dispatches model calls to the backend: surface lookup, then a bridged backend call.
pub struct MetaToolRunner<'run, B: ?Sized> {
    surface: &'run MetaToolSurface,
    bridge: &'run ExecutionBridge,
    backend: &'run B,
}

impl<'run, B: ExecutionBackend + ?Sized> MetaToolRunner<'run, B> {
    /// Borrows the pieces needed for one turn.
    pub fn new(
        surface: &'run MetaToolSurface,
        bridge: &'run ExecutionBridge,
        backend: &'run B,
    ) -> Self {
        Self {
            surface,
            bridge,
            backend,
        }
    }
}

impl<B: ExecutionBackend + ?Sized> ToolDispatcher for MetaToolRunner<'_, B> {
    fn descriptors(&self) -> &[MetaToolDescriptor] {
        self.surface.descriptors()
    }

    fn dispatch(&self, call: &ToolCall) -> Result<String> {
        let request = self.surface.resolve(call)?;
        tracing::debug!(tool = call.name(), input = %request.summary(), "meta-tool call");

        let response = request.run(self.bridge, self.backend);
        match (&request, &response) {
            (MetaToolRequest::Execute { .. } | MetaToolRequest::ExecuteTypescript { .. }, Ok(text)) => {
                tracing::debug!(tool = call.name(), %text, "meta-tool response");
            }
            _ => tracing::debug!(tool = call.name(), ok = response.is_ok(), "meta-tool response"),
        }
        response
    }
}
