//! Deployment status and operator actions.
//!
//! One logical Deployment exists per host:
//! ```text
//! install  → Configured (configuration persisted, nothing running)
//! start    → Running
//! stop     → Stopped (data kept, can start again)
//! reset    → Configured (data removed, configuration kept)
//! uninstall→ Absent
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// No persisted configuration.
    Absent,
    /// Configuration persisted, services never started or data reset.
    Configured,
    Running,
    Stopped,
}

impl DeploymentStatus {
    pub fn is_installed(&self) -> bool {
        !matches!(self, DeploymentStatus::Absent)
    }

    /// Check if transition to target state is valid.
    pub fn can_transition_to(&self, target: DeploymentStatus) -> bool {
        use DeploymentStatus::*;
        matches!(
            (self, target),
            // install (first time or over an existing configuration)
            (_, Configured) |
            // start from either entry point; restart/update from anywhere installed
            (Configured, Running) |
            (Stopped, Running) |
            (Running, Running) |
            // stop
            (Running, Stopped) |
            (Configured, Stopped) |
            (Stopped, Stopped) |
            // uninstall
            (Configured, Absent) |
            (Running, Absent) |
            (Stopped, Absent)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Absent => "absent",
            DeploymentStatus::Configured => "configured",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Start,
    Stop,
    Restart,
    Update,
    Reset,
    Uninstall,
}

impl Action {
    /// Status the deployment is left in when the action completes.
    pub fn target(&self) -> DeploymentStatus {
        match self {
            Action::Install | Action::Reset => DeploymentStatus::Configured,
            Action::Start | Action::Restart | Action::Update => DeploymentStatus::Running,
            Action::Stop => DeploymentStatus::Stopped,
            Action::Uninstall => DeploymentStatus::Absent,
        }
    }

    /// Every action except install operates on a persisted configuration.
    pub fn requires_configuration(&self) -> bool {
        !matches!(self, Action::Install)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Update => "update",
            Action::Reset => "reset",
            Action::Uninstall => "uninstall",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
