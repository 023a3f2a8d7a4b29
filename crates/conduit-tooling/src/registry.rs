//! Registry of domain functions.

use std::sync::Arc;

use super::DomainFunction;

type FunctionList = Arc<Vec<Arc<dyn DomainFunction>>>;

/// Ordered, cheaply cloneable set of domain functions
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: FunctionList,
}

impl FunctionRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: Arc::new(Vec::new()),
        }
    }

    /// Add a function to the registry
    #[must_use]
    pub fn with_function(mut self, function: Arc<dyn DomainFunction>) -> Self {
        Arc::make_mut(&mut self.functions).push(function);
        self
    }

    /// Get a function by name, if it exists
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn DomainFunction>> {
        self.functions
            .iter()
            .find(|function| function.name() == name)
            .cloned()
    }

    /// List all functions in registration order
    #[must_use]
    pub fn list(&self) -> Vec<&dyn DomainFunction> {
        self.functions.iter().map(AsRef::as_ref).collect()
    }

    /// Names of all functions in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(|function| function.name().to_owned())
            .collect()
    }

    /// Builds a new registry by transforming every function
    #[must_use]
    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(&Arc<dyn DomainFunction>) -> Arc<dyn DomainFunction>,
    {
        Self {
            functions: Arc::new(self.functions.iter().map(transform).collect()),
        }
    }

    /// Get number of registered functions
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Arc<dyn DomainFunction>> for FunctionRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn DomainFunction>>>(iter: I) -> Self {
        Self {
            functions: Arc::new(iter.into_iter().collect()),
        }
    }
}
