//! Invocation tracing for domain functions.
//!
//! Code running in the remote sandbox calls domain functions the model never sees
//! as tool calls. Wrapping each function in a [`TracedFunction`] records every such
//! call as a matched [`ToolCall`]/[`ToolMessage`] pair in a [`TraceBuffer`], which
//! the orchestrator clears before and drains after each meta-tool dispatch.

use std::sync::{Arc, Mutex, MutexGuard};

use conduit_core::{ToolCall, ToolMessage, now_timestamp};
use serde_json::Value;

use crate::{DomainFunction, FunctionArgs, FunctionRegistry, FunctionResult, to_json_str};

/// One captured domain call and its response.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedCall {
    /// Synthesized call with a fresh id.
    pub call: ToolCall,
    /// Response matching `call`.
    pub response: ToolMessage,
}

/// Shared accumulator of traced calls.
///
/// Clones share the same storage: the orchestrator keeps one handle, the traced
/// functions registered with the backend keep the others.
#[derive(Debug, Clone, Default)]
pub struct TraceBuffer {
    entries: Arc<Mutex<Vec<TracedCall>>>,
}

impl TraceBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a domain function panicked mid-record.
    fn lock(&self) -> MutexGuard<'_, Vec<TracedCall>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Appends a captured call.
    pub fn record(&self, traced: TracedCall) {
        self.lock().push(traced);
    }

    /// Discards everything captured so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes and returns everything captured so far, in capture order.
    #[must_use]
    pub fn drain(&self) -> Vec<TracedCall> {
        self.lock().drain(..).collect()
    }

    /// Number of captured calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

type Serializer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Wraps domain functions so their calls land in a [`TraceBuffer`].
#[derive(Clone)]
pub struct Tracer {
    buffer: TraceBuffer,
    serializer: Serializer,
}

impl Tracer {
    /// Creates a tracer recording into `buffer`, serializing results with [`to_json_str`].
    #[must_use]
    pub fn new(buffer: TraceBuffer) -> Self {
        Self {
            buffer,
            serializer: Arc::new(to_json_str),
        }
    }

    /// Uses `serializer` to turn results into tool message content.
    #[must_use]
    pub fn with_serializer<S>(mut self, serializer: S) -> Self
    where
        S: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Buffer the wrapped functions record into.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Wraps a single function.
    #[must_use]
    pub fn wrap(&self, function: Arc<dyn DomainFunction>) -> Arc<dyn DomainFunction> {
        Arc::new(TracedFunction {
            inner: function,
            buffer: self.buffer.clone(),
            serializer: Arc::clone(&self.serializer),
        })
    }

    /// Wraps every function of `registry`, preserving order.
    #[must_use]
    pub fn wrap_registry(&self, registry: &FunctionRegistry) -> FunctionRegistry {
        registry.map(|function| self.wrap(Arc::clone(function)))
    }
}

/// A domain function whose calls are recorded.
///
/// Same name, description and schema as the wrapped function. Failures never
/// surface to the caller: they are recorded as error-flagged responses and the
/// caller receives the `"Error: ..."` text in place of a result.
pub struct TracedFunction {
    inner: Arc<dyn DomainFunction>,
    buffer: TraceBuffer,
    serializer: Serializer,
}

impl DomainFunction for TracedFunction {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters(&self) -> Value {
        self.inner.parameters()
    }

    fn call(&self, args: &FunctionArgs) -> FunctionResult<Value> {
        let call = ToolCall::new(self.inner.name(), args.clone());
        tracing::debug!(function = call.name(), arguments = ?call.arguments(), "env call");

        let (result, error) = match self.inner.call(args) {
            Ok(value) => (value, false),
            Err(err) => (Value::String(format!("Error: {err}")), true),
        };

        let content = (self.serializer)(&result);
        tracing::debug!(function = call.name(), error, %content, "env response");

        let response = if error {
            ToolMessage::failure(call.id(), content)
        } else {
            ToolMessage::success(call.id(), content)
        }
        .with_timestamp(now_timestamp());

        self.buffer.record(TracedCall { call, response });
        Ok(result)
    }
}
