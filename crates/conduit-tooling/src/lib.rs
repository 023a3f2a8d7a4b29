//! Domain-function tooling for the code-mode agent.
//!
//! This crate provides the pieces that sit between the domain environment and the
//! remote execution backend:
//! - `DomainFunction` trait and registry for the environment's callable functions
//! - `Tracer` that records every domain call as a tool-call/response pair
//! - `ExecutionBackend` trait describing the remote sandbox
//! - Function list rendering for prompts
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

/// Remote execution backend interface and report types.
mod backend;
/// Domain environment interface and result serialization.
mod environment;
/// Core abstractions shared by all domain functions.
mod function;
/// Registry of domain functions.
mod registry;
/// Function list rendering for prompts.
mod signatures;
/// Invocation tracing for domain functions.
mod tracer;

pub use backend::{BackendError, BackendResult, ExecutionBackend, ExecutionReport, FunctionListing};
pub use environment::{DomainEnvironment, Environment, to_json_str};
pub use function::{DomainFunction, FnFunction, FunctionArgs, FunctionError, FunctionResult};
pub use registry::FunctionRegistry;
pub use signatures::render_function_list;
pub use tracer::{TraceBuffer, TracedCall, TracedFunction, Tracer};
