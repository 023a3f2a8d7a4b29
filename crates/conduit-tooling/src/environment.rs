//! Domain environment interface and result serialization.

use serde_json::{Value, to_string};

use crate::FunctionRegistry;

/// Serializes a domain result into tool message content.
///
/// Strings pass through unchanged; every other value becomes compact JSON.
pub fn to_json_str(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// The evaluated domain: a namespace of callable functions plus its policy.
pub trait Environment: Send + Sync {
    /// Namespace the functions are registered under.
    fn domain_name(&self) -> &str;

    /// Policy document given to the model.
    fn policy(&self) -> &str;

    /// Every function the environment exposes.
    fn functions(&self) -> FunctionRegistry;

    /// Serializes a function result into tool message content.
    fn to_json_str(&self, value: &Value) -> String {
        to_json_str(value)
    }
}

/// Environment assembled from plain values.
#[derive(Clone)]
pub struct DomainEnvironment {
    domain_name: String,
    policy: String,
    functions: FunctionRegistry,
}

impl DomainEnvironment {
    /// Creates an environment with no functions.
    pub fn new<N: Into<String>, P: Into<String>>(domain_name: N, policy: P) -> Self {
        Self {
            domain_name: domain_name.into(),
            policy: policy.into(),
            functions: FunctionRegistry::new(),
        }
    }

    /// Sets the function registry.
    #[must_use]
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }
}

impl Environment for DomainEnvironment {
    fn domain_name(&self) -> &str {
        &self.domain_name
    }

    fn policy(&self) -> &str {
        &self.policy
    }

    fn functions(&self) -> FunctionRegistry {
        self.functions.clone()
    }
}
