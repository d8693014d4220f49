//! [`ContainerRuntime`] backed by the `docker` and compose CLIs.

use super::ContainerRuntime;
use crate::util::process;
use ambar_shared::errors::{AmbarError, AmbarResult};
use async_trait::async_trait;
use std::path::Path;

/// How compose is invoked on this host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeCommand {
    /// Standalone `docker-compose` binary.
    Standalone,
    /// `docker compose` plugin.
    Plugin,
}

impl ComposeCommand {
    /// Program and leading arguments.
    fn invocation(&self) -> (&'static str, Vec<String>) {
        match self {
            ComposeCommand::Standalone => ("docker-compose", Vec::new()),
            ComposeCommand::Plugin => ("docker", vec!["compose".to_string()]),
        }
    }

    /// Pick the first compose flavour that answers a version query.
    pub async fn detect() -> Option<Self> {
        if process::probe("docker-compose", &process::args(["-v"])).await {
            return Some(ComposeCommand::Standalone);
        }
        if process::probe("docker", &process::args(["compose", "version"])).await {
            return Some(ComposeCommand::Plugin);
        }
        None
    }
}

impl std::str::FromStr for ComposeCommand {
    type Err = AmbarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docker-compose" => Ok(ComposeCommand::Standalone),
            "docker compose" | "plugin" => Ok(ComposeCommand::Plugin),
            other => Err(AmbarError::InvalidArgument(format!(
                "unknown compose command '{other}' (expected 'docker-compose' or 'docker compose')"
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DockerCli {
    compose: ComposeCommand,
}

impl DockerCli {
    pub fn new(compose: ComposeCommand) -> Self {
        Self { compose }
    }

    async fn compose(&self, descriptor: &Path, project: &str, verb: &[&str]) -> AmbarResult<()> {
        let (program, mut args) = self.compose.invocation();
        args.extend([
            "-f".to_string(),
            descriptor.display().to_string(),
            "-p".to_string(),
            project.to_string(),
        ]);
        args.extend(verb.iter().map(|s| s.to_string()));
        process::run_strict(program, &args).await
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull_image(&self, image: &str) -> AmbarResult<()> {
        tracing::info!(image, "Pulling image");
        process::run_strict("docker", &process::args(["pull", image])).await
    }

    async fn compose_pull(&self, descriptor: &Path, project: &str) -> AmbarResult<()> {
        self.compose(descriptor, project, &["pull"]).await
    }

    async fn compose_up(&self, descriptor: &Path, project: &str) -> AmbarResult<()> {
        self.compose(descriptor, project, &["up", "-d"]).await
    }

    async fn compose_down(&self, descriptor: &Path, project: &str) -> AmbarResult<()> {
        self.compose(descriptor, project, &["down"]).await
    }

    async fn list_containers_by_ancestor(&self, image: &str) -> AmbarResult<Vec<String>> {
        let filter = format!("ancestor={image}");
        let out = process::capture(
            "docker",
            &process::args(["ps", "-a", "-q", "--filter", filter.as_str()]),
        )
        .await?;
        Ok(parse_container_ids(&out))
    }

    async fn remove_containers(&self, ids: &[String]) -> AmbarResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut args = process::args(["rm", "-f"]);
        args.extend(ids.iter().cloned());
        process::run_strict("docker", &args).await
    }
}

fn parse_container_ids(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
