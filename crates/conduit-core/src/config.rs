//! Agent configuration and the operating mode switch.

use core::fmt;
use core::str::FromStr;
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::{from_str, to_string_pretty};

use crate::{Error, Result};

/// Environment variable selecting the meta-tool surface.
pub const MODE_ENV_VAR: &str = "CONDUIT_MODE";

/// Default number of nested calls per dispatch above which a warning is logged.
const DEFAULT_NESTED_CALL_WARNING: usize = 64;

/// Which set of meta-tools the model is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Discover functions, fetch their details, then execute code.
    #[default]
    #[serde(alias = "code")]
    Discovery,
    /// Explore with shell commands and execute code; functions are listed upfront.
    #[serde(alias = "fs")]
    Filesystem,
}

impl ToolMode {
    /// Canonical name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "code" | "discovery" => Ok(Self::Discovery),
            "fs" | "filesystem" => Ok(Self::Filesystem),
            other => Err(Error::Config(format!(
                "Unknown tool mode '{other}' (expected code, discovery, fs or filesystem)"
            ))),
        }
    }
}

/// Settings resolved once when an agent is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Meta-tool surface exposed to the model
    pub mode: ToolMode,
    /// Nested calls per dispatch above which a warning is logged
    pub nested_call_warning: usize,
    /// Optional cap on tool rounds within one turn (unbounded when unset)
    pub max_tool_iterations: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: ToolMode::default(),
            nested_call_warning: DEFAULT_NESTED_CALL_WARNING,
            max_tool_iterations: None,
        }
    }
}

impl AgentConfig {
    /// Default configuration with the given mode.
    #[must_use]
    pub fn with_mode(mode: ToolMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Reads the mode from the process environment.
    ///
    /// # Errors
    /// Returns an error if the variable holds an unknown mode
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    /// Returns an error if the variable holds an unknown mode
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(MODE_ENV_VAR) {
            Some(raw) => raw.parse()?,
            None => ToolMode::default(),
        };
        tracing::debug!(%mode, "resolved tool mode");
        Ok(Self::with_mode(mode))
    }

    /// Loads config from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = from_str(&contents)?;

        tracing::debug!(
            "Loaded config from {:?}: mode={}, max_tool_iterations={:?}",
            path,
            config.mode,
            config.max_tool_iterations
        );

        Ok(config)
    }

    /// Saves config to a TOML file, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }
}
