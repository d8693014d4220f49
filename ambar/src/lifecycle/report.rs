//! What an action did.

use super::state::{Action, DeploymentStatus};
use serde::Serialize;

/// A best-effort step that failed without aborting the action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepWarning {
    pub step: String,
    pub message: String,
}

impl StepWarning {
    pub fn new(step: impl Into<String>, message: impl ToString) -> Self {
        Self {
            step: step.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for StepWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    /// The operator declined a confirmation; nothing was changed.
    Cancelled,
}

/// Returned by every [`Deployment`](super::Deployment) action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: Action,
    pub outcome: Outcome,
    /// Status the deployment was left in.
    pub status: DeploymentStatus,
    pub warnings: Vec<StepWarning>,
    /// `{protocol}://{host}:{port}` of the frontend, once started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend: Option<String>,
}

impl ActionReport {
    pub(crate) fn completed(action: Action) -> Self {
        Self {
            action,
            outcome: Outcome::Completed,
            status: action.target(),
            warnings: Vec::new(),
            frontend: None,
        }
    }

    pub(crate) fn cancelled(action: Action, status: DeploymentStatus) -> Self {
        Self {
            action,
            outcome: Outcome::Cancelled,
            status,
            warnings: Vec::new(),
            frontend: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == Outcome::Cancelled
    }
}
