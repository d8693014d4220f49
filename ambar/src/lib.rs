//! Ambar deployment lifecycle controller.
//!
//! Installs, starts, stops, updates and tears down the Ambar container stack
//! on a single host. The [`Deployment`] controller drives injected
//! collaborators ([`ContainerRuntime`], [`KernelTuner`], [`Fetcher`],
//! [`Prompter`], [`HealthProbe`]) and owns the persisted configuration and
//! the rendered compose descriptor in its [`InstallLayout`].

pub mod config;
pub mod fetch;
pub mod health;
pub mod host_check;
pub mod layout;
pub mod lifecycle;
pub mod lock;
pub mod render;
pub mod runtime;
pub mod tuning;
pub mod util;

pub use ambar_shared::errors::{AmbarError, AmbarResult};
pub use config::{ConfigSource, ConfigStore, Configuration, Endpoint, Scalar};
pub use fetch::{Fetcher, HttpFetcher};
pub use health::{HealthProbe, HttpProbe, WaitPolicy};
pub use layout::InstallLayout;
pub use lifecycle::{
    Action, ActionReport, Collaborators, Deployment, DeploymentStatus, InstallOptions, Outcome,
    Prompter, StdinPrompter, StepWarning,
};
pub use lock::InstallLock;
pub use runtime::{ComposeCommand, ContainerRuntime, DockerCli};
pub use tuning::{KernelTuner, SysctlTuner};
