use core::fmt;

use serde_json::{Error as SerdeJsonError, Map, Value, json};
use thiserror::Error;

/// Keyword arguments passed to a domain function.
pub type FunctionArgs = Map<String, Value>;

/// Errors that can occur during a domain function call.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// The provided arguments were invalid or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The function failed to perform its operation.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Failed to serialize or deserialize data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
}

/// Result type for domain function calls.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// A business-logic operation exposed by the domain environment.
///
/// Domain functions are never called by the model directly; code executed in the
/// remote sandbox calls them by qualified name.
pub trait DomainFunction: Send + Sync {
    /// Returns the unique identifier for this function.
    fn name(&self) -> &str;

    /// Returns a human-readable description of what this function does.
    fn description(&self) -> &str;

    /// Returns the JSON schema of the keyword arguments.
    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    /// Calls the function with keyword arguments.
    ///
    /// # Errors
    ///
    /// Returns a `FunctionError` if the arguments are invalid or the call fails.
    fn call(&self, args: &FunctionArgs) -> FunctionResult<Value>;
}

type Handler = dyn Fn(&FunctionArgs) -> FunctionResult<Value> + Send + Sync;

/// Domain function backed by a closure.
pub struct FnFunction {
    name: String,
    description: String,
    parameters: Value,
    handler: Box<Handler>,
}

impl FnFunction {
    /// Creates a function from a name, description and handler.
    pub fn new<N, D, H>(name: N, description: D, handler: H) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        H: Fn(&FunctionArgs) -> FunctionResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({ "type": "object", "properties": {} }),
            handler: Box::new(handler),
        }
    }

    /// Sets the argument schema.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

impl fmt::Debug for FnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl DomainFunction for FnFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn call(&self, args: &FunctionArgs) -> FunctionResult<Value> {
        (self.handler)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_user() -> FnFunction {
        FnFunction::new("get_user_details", "Look up a user", |args: &FunctionArgs| {
            match args.get("user_id").and_then(Value::as_str) {
                Some("mia_li_3668") => Ok(json!({"name": "Mia Li", "membership": "gold"})),
                Some(other) => Err(FunctionError::ExecutionFailed(format!(
                    "User {other} not found"
                ))),
                None => Err(FunctionError::InvalidInput("user_id is required".to_owned())),
            }
        })
    }

    #[test]
    fn test_fn_function_success() {
        let function = lookup_user();
        let mut args = FunctionArgs::new();
        args.insert("user_id".to_owned(), json!("mia_li_3668"));

        let result = function.call(&args).unwrap();
        assert_eq!(result["membership"], "gold");
        assert_eq!(function.name(), "get_user_details");
    }

    #[test]
    fn test_fn_function_errors() {
        let function = lookup_user();
        let missing = function.call(&FunctionArgs::new()).unwrap_err();
        assert!(matches!(missing, FunctionError::InvalidInput(_)));

        let mut args = FunctionArgs::new();
        args.insert("user_id".to_owned(), json!("nobody"));
        let not_found = function.call(&args).unwrap_err();
        assert_eq!(not_found.to_string(), "User nobody not found");
    }

    #[test]
    fn test_default_parameters_schema() {
        let function = lookup_user().with_parameters(json!({
            "type": "object",
            "properties": {"user_id": {"type": "string"}},
            "required": ["user_id"]
        }));
        assert_eq!(function.parameters()["required"][0], "user_id");
    }
}
