use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ambar::health::WaitPolicy;
use ambar::{
    Collaborators, ComposeCommand, Deployment, DockerCli, HttpFetcher, HttpProbe, InstallLayout,
    StdinPrompter, SysctlTuner,
};
use ambar_shared::constants::{envs, wait};
use clap::{Args, Parser, Subcommand};

use crate::commands;

#[derive(Parser, Debug)]
#[command(name = "ambar", version, about = "Ambar installation and lifecycle tool")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Directory holding config.json and the compose files
    #[arg(long, global = true, env = envs::AMBAR_HOME)]
    pub home: Option<PathBuf>,

    /// Log at info level instead of warn
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Compose invocation: `docker-compose` or `docker compose` (auto-detected by default)
    #[arg(long, global = true, env = envs::AMBAR_COMPOSE)]
    pub compose_cmd: Option<ComposeCommand>,

    /// Skip docker, compose and root checks
    #[arg(long, global = true, hide = true)]
    pub skip_checks: bool,
}

impl GlobalFlags {
    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(self.home.clone().unwrap_or_else(InstallLayout::default_home))
    }

    /// Verify the host, then wire the production collaborators.
    pub async fn create_deployment(&self) -> anyhow::Result<Deployment> {
        let compose = if self.skip_checks {
            self.compose_cmd.clone().unwrap_or(ComposeCommand::Standalone)
        } else {
            ambar::host_check::check_host(self.compose_cmd.clone())
                .await?
                .compose
        };

        let layout = self.layout();
        tracing::debug!(home = %layout.home_dir().display(), compose = ?compose, "Using install home");

        let collaborators = Collaborators {
            runtime: Arc::new(DockerCli::new(compose)),
            kernel: Arc::new(SysctlTuner::default()),
            fetcher: Arc::new(HttpFetcher::new()?),
            prompter: Arc::new(StdinPrompter),
            probe: Arc::new(HttpProbe::new()?),
        };
        Ok(Deployment::new(layout, collaborators))
    }
}

/// Readiness flags shared by the actions that start services.
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Do not wait for Ambar to start
    #[arg(long)]
    pub nowait: bool,

    /// Seconds to wait for the frontend to answer
    #[arg(long, value_name = "SECS", default_value_t = wait::DEFAULT_TIMEOUT_SECS)]
    pub wait_timeout: u64,
}

impl WaitArgs {
    pub fn policy(&self) -> WaitPolicy {
        if self.nowait {
            WaitPolicy::Skip
        } else {
            WaitPolicy::poll_for(Duration::from_secs(self.wait_timeout))
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch configuration, confirm host and port, pull images
    Install(commands::install::InstallArgs),
    /// Start Ambar
    Start(commands::start::StartArgs),
    /// Stop Ambar, keeping data
    Stop(commands::stop::StopArgs),
    /// Stop then start Ambar
    Restart(commands::restart::RestartArgs),
    /// Fetch the latest compose template, pull images and restart
    Update(commands::update::UpdateArgs),
    /// Delete all data, keeping the configuration
    Reset(commands::reset::ResetArgs),
    /// Delete all data and every installed file
    Uninstall(commands::uninstall::UninstallArgs),
}
