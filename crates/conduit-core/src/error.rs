use core::result::Result as CoreResult;
use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;
use toml::ser::Error as TomlSerError;

/// Result type for agent operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while driving an agent turn.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// TOML serialization failed.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] TomlSerError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The base conversational model failed to produce a reply.
    #[error("Model error: {0}")]
    Model(String),

    /// The remote execution backend failed or is unreachable.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The sync/async bridge could not run the request.
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// The model asked for a meta-tool that is not part of the active surface.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A meta-tool was called with arguments that do not match its schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Name of the meta-tool that was called.
        tool: String,
        /// Why the arguments were rejected.
        reason: String,
    },

    /// The caller-imposed tool round budget was exhausted.
    #[error("Tool iteration limit of {0} exceeded")]
    IterationLimit(usize),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error belongs inside the conversation.
    ///
    /// Returns `true` for dispatch failures the model can react to (unknown tool,
    /// malformed arguments). Everything else is infrastructural and fails the turn.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments { .. })
    }
}
