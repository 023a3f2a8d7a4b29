//! Traced functions called back from an async execution backend
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

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use conduit_tooling::{
    BackendError, BackendResult, DomainEnvironment, Environment, ExecutionBackend,
    ExecutionReport, FnFunction, FunctionArgs, FunctionError, FunctionListing, FunctionRegistry,
    TraceBuffer, Tracer, render_function_list,
};
use serde_json::{Value, from_str, json};
use tokio::task::yield_now;

/// Runs one `name {json-args}` call per line against the registered functions
#[derive(Default)]
struct LineSandbox {
    namespace: String,
    functions: FunctionRegistry,
    connected: bool,
}

#[async_trait]
impl ExecutionBackend for LineSandbox {
    fn register_functions(&mut self, namespace: &str, functions: FunctionRegistry) {
        namespace.clone_into(&mut self.namespace);
        self.functions = functions;
    }

    async fn connect(&mut self) -> BackendResult<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> BackendResult<()> {
        self.connected = false;
        Ok(())
    }

    fn session_id(&self) -> Option<String> {
        self.connected.then(|| "line-sandbox".to_owned())
    }

    async fn list_functions(&self) -> BackendResult<FunctionListing> {
        let list = render_function_list(&self.functions.list())
            .map_err(|err| BackendError::Protocol(err.to_string()))?;
        Ok(FunctionListing::new(format!("{}:\n{list}", self.namespace)))
    }

    async fn get_function_details(&self, functions: &[String]) -> BackendResult<FunctionListing> {
        let details: Vec<String> = functions
            .iter()
            .filter_map(|name| self.functions.get(name))
            .map(|function| format!("{}: {}", function.name(), function.description()))
            .collect();
        Ok(FunctionListing::new(details.join("\n")))
    }

    async fn execute(&self, code: &str) -> BackendResult<ExecutionReport> {
        if !self.connected {
            return Err(BackendError::NotConnected);
        }

        let mut results = Vec::new();
        for line in code.lines().filter(|line| !line.trim().is_empty()) {
            let (name, raw_args) = line.split_once(' ').unwrap_or((line, "{}"));
            let args: FunctionArgs =
                from_str(raw_args).map_err(|err| BackendError::Protocol(err.to_string()))?;
            let Some(function) = self.functions.get(name) else {
                return Ok(ExecutionReport::failed(format!("{name} is not defined")));
            };
            // Let the reactor interleave other work between calls
            yield_now().await;
            match function.call(&args) {
                Ok(value) => results.push(value),
                Err(err) => return Ok(ExecutionReport::failed(err.to_string())),
            }
        }

        Ok(ExecutionReport::succeeded(Some(Value::Array(results))))
    }

    async fn execute_bash(&self, _command: &str) -> BackendResult<ExecutionReport> {
        Ok(ExecutionReport::failed("bash is not available"))
    }
}

fn environment() -> DomainEnvironment {
    let registry = FunctionRegistry::new()
        .with_function(Arc::new(FnFunction::new(
            "find_flight",
            "Search flights by route",
            |args: &FunctionArgs| {
                Ok(json!({
                    "origin": args.get("origin").cloned().unwrap_or(Value::Null),
                    "flights": ["HAT001", "HAT002"],
                }))
            },
        )))
        .with_function(Arc::new(FnFunction::new(
            "book_flight",
            "Book a flight",
            |_: &FunctionArgs| {
                Err(FunctionError::ExecutionFailed(
                    "Payment method declined".to_owned(),
                ))
            },
        )));
    DomainEnvironment::new("airline", "Book only with a valid payment method.")
        .with_functions(registry)
}

async fn traced_sandbox(buffer: &TraceBuffer) -> LineSandbox {
    let env = environment();
    let tracer = Tracer::new(buffer.clone());
    let mut sandbox = LineSandbox::default();
    sandbox.register_functions(env.domain_name(), tracer.wrap_registry(&env.functions()));
    sandbox.connect().await.unwrap();
    sandbox
}

#[tokio::test]
async fn test_backend_calls_are_traced_in_order() -> Result<()> {
    let buffer = TraceBuffer::new();
    let sandbox = traced_sandbox(&buffer).await;

    let report = sandbox
        .execute("find_flight {\"origin\": \"SFO\"}\nbook_flight {\"flight\": \"HAT001\"}")
        .await?;

    // The failing call does not abort the script
    assert!(report.success);
    let output = report.output.unwrap();
    assert_eq!(output[0]["flights"][1], "HAT002");
    assert_eq!(output[1], "Error: Payment method declined");

    let captured = buffer.drain();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].call.name(), "find_flight");
    assert_eq!(captured[0].call.arguments()["origin"], "SFO");
    assert!(!captured[0].response.error);
    assert_eq!(captured[1].call.name(), "book_flight");
    assert!(captured[1].response.error);
    assert_eq!(captured[1].response.content, "Error: Payment method declined");
    assert_ne!(captured[0].call.id(), captured[1].call.id());
    Ok(())
}

#[tokio::test]
async fn test_discovery_operations_do_not_trace() -> Result<()> {
    let buffer = TraceBuffer::new();
    let sandbox = traced_sandbox(&buffer).await;

    let listing = sandbox.list_functions().await?;
    assert_eq!(listing.code, "airline:\n- find_flight\n- book_flight");

    let details = sandbox
        .get_function_details(&["book_flight".to_owned()])
        .await?;
    assert_eq!(details.code, "book_flight: Book a flight");

    assert!(buffer.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_execute_requires_connection() {
    let buffer = TraceBuffer::new();
    let mut sandbox = traced_sandbox(&buffer).await;
    sandbox.disconnect().await.unwrap();

    let result = sandbox.execute("find_flight").await;
    assert!(matches!(result, Err(BackendError::NotConnected)));
    assert!(sandbox.session_id().is_none());
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_report_markdown_from_backend() -> Result<()> {
    let buffer = TraceBuffer::new();
    let sandbox = traced_sandbox(&buffer).await;

    let missing = sandbox.execute("refund_flight").await?;
    assert!(missing.markdown().starts_with("Code Executed Successfully: false"));
    assert!(missing.markdown().contains("# STDERR\nrefund_flight is not defined"));
    Ok(())
}
