//! Error types shared across the workspace.
//!
//! Every fallible operation in the deployment library returns [`AmbarResult`].
//! Variants are grouped by the component that raises them so the CLI can
//! print a precise message without inspecting strings.

use thiserror::Error;

/// Result alias used throughout Ambar.
pub type AmbarResult<T> = Result<T, AmbarError>;

#[derive(Debug, Error)]
pub enum AmbarError {
    // ------------------------------------------------------------------
    // Configuration store
    // ------------------------------------------------------------------
    /// Remote configuration could not be retrieved.
    #[error("configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// Configuration text could not be parsed or lacks required keys.
    #[error("configuration malformed: {0}")]
    ConfigMalformed(String),

    /// No persisted configuration exists for an action that needs one.
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    // ------------------------------------------------------------------
    // Template renderer
    // ------------------------------------------------------------------
    /// A template references a configuration field that is absent.
    #[error("template references ${{{placeholder}}} but configuration field '{field}' is missing")]
    KeyMissing {
        placeholder: String,
        field: &'static str,
    },

    /// A binding value would re-introduce placeholder syntax into the output.
    #[error("value for ${{{placeholder}}} contains placeholder syntax: {value:?}")]
    UnsafeValue { placeholder: String, value: String },

    /// The template could not be read or rendered.
    #[error("render error: {0}")]
    Render(String),

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------
    /// Remote retrieval failed.
    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// An external command exited unsuccessfully or could not be spawned.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    /// Kernel parameter tuning failed.
    #[error("kernel tuning failed: {0}")]
    Tuning(String),

    /// Filesystem operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    // ------------------------------------------------------------------
    // Operator input / host
    // ------------------------------------------------------------------
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Host does not meet a precondition (tool missing, not root).
    #[error("unsupported host: {0}")]
    Unsupported(String),

    /// A bounded wait elapsed without the expected signal.
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AmbarError {
    /// Build a [`AmbarError::Command`] from a display-able command line.
    pub fn command(command: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AmbarError::Command {
            command: command.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for AmbarError {
    fn from(e: serde_json::Error) -> Self {
        AmbarError::ConfigMalformed(e.to_string())
    }
}
