//! Container runtime abstraction.
//!
//! The lifecycle controller only talks to [`ContainerRuntime`]; [`DockerCli`]
//! is the production implementation and tests substitute an in-memory fake.

mod docker;

pub use docker::{ComposeCommand, DockerCli};

use ambar_shared::errors::AmbarResult;
use async_trait::async_trait;
use std::path::Path;

/// Operations the deployment needs from the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pull a single image reference.
    async fn pull_image(&self, image: &str) -> AmbarResult<()>;

    /// Pull every image referenced by the descriptor.
    async fn compose_pull(&self, descriptor: &Path, project: &str) -> AmbarResult<()>;

    /// Create and start the declarative service set, detached.
    async fn compose_up(&self, descriptor: &Path, project: &str) -> AmbarResult<()>;

    /// Stop and remove the declarative service set.
    async fn compose_down(&self, descriptor: &Path, project: &str) -> AmbarResult<()>;

    /// IDs of all containers (running or not) created from `image`.
    async fn list_containers_by_ancestor(&self, image: &str) -> AmbarResult<Vec<String>>;

    /// Force-remove the given containers.
    async fn remove_containers(&self, ids: &[String]) -> AmbarResult<()>;
}
