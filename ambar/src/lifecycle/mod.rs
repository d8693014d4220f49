//! Deployment lifecycle controller.
//!
//! Every operator action is a method on [`Deployment`]. Public actions hold
//! the [`InstallLock`] for their whole duration and are refused unless the
//! [`DeploymentStatus`] table allows them; the composite ones (restart,
//! update, reset, uninstall) reuse the lock-free internal steps so the lock
//! is only taken once per invocation.
//!
//! Install applies the operator's host and port answers before deriving
//! missing `public_uri` values, so derived URIs always carry the confirmed
//! address. URIs present in the fetched configuration are kept as written.

mod prompt;
mod report;
mod state;

pub use prompt::{Prompter, StdinPrompter, is_confirmed, parse_host_answer, parse_port_answer};
pub use report::{ActionReport, Outcome, StepWarning};
pub use state::{Action, DeploymentStatus};

use crate::config::{ConfigSource, ConfigStore, Configuration};
use crate::fetch::Fetcher;
use crate::health::{self, HealthProbe, WaitPolicy};
use crate::layout::InstallLayout;
use crate::lock::InstallLock;
use crate::render;
use crate::runtime::ContainerRuntime;
use crate::tuning::{self, KernelTuner};
use crate::util::fs as fsutil;
use ambar_shared::constants::compose;
use ambar_shared::errors::{AmbarError, AmbarResult};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

/// External systems the controller drives.
#[derive(Clone)]
pub struct Collaborators {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub kernel: Arc<dyn KernelTuner>,
    pub fetcher: Arc<dyn Fetcher>,
    pub prompter: Arc<dyn Prompter>,
    pub probe: Arc<dyn HealthProbe>,
}

/// Inputs to `install`.
#[derive(Clone, Debug)]
pub struct InstallOptions {
    pub source: ConfigSource,
    /// Address proposed to the operator as the external host.
    pub detected_address: Ipv4Addr,
}

/// One Ambar installation on this host.
pub struct Deployment {
    layout: InstallLayout,
    store: ConfigStore,
    deps: Collaborators,
}

impl Deployment {
    pub fn new(layout: InstallLayout, deps: Collaborators) -> Self {
        let store = ConfigStore::new(layout.config_path());
        Self {
            layout,
            store,
            deps,
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// `Absent` without a persisted configuration, `Configured` otherwise.
    pub fn status(&self) -> DeploymentStatus {
        if self.store.exists() {
            DeploymentStatus::Configured
        } else {
            DeploymentStatus::Absent
        }
    }

    /// Take the install lock and check `action` against the current status.
    fn begin(&self, action: Action) -> AmbarResult<InstallLock> {
        self.layout.prepare()?;
        let lock = InstallLock::acquire(self.layout.home_dir())?;

        let status = self.status();
        if action.requires_configuration() && !status.is_installed() {
            return Err(AmbarError::ConfigInvalid(format!(
                "cannot {action}: no configuration at {}; run `ambar install` first",
                self.layout.config_path().display()
            )));
        }
        if !status.can_transition_to(action.target()) {
            return Err(AmbarError::InvalidArgument(format!(
                "cannot {action} while {status}"
            )));
        }
        tracing::debug!(action = %action, status = %status, "Action admitted");
        Ok(lock)
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Obtain configuration, confirm the external host and port, persist,
    /// render, pull images and persist kernel tuning.
    ///
    /// Everything that can fail on operator input or the network happens
    /// before the configuration is written.
    pub async fn install(&self, options: InstallOptions) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Install)?;
        tracing::info!(source = ?options.source, "Installing Ambar");

        let mut config = self
            .store
            .load_raw(&options.source, self.deps.fetcher.as_ref())
            .await?;
        let template = self
            .deps
            .fetcher
            .fetch(&config.docker_compose_template)
            .await?;

        let answer = self.deps.prompter.ask(&format!(
            "Assigning {} ip address to Ambar, Y to confirm or type in another IP address...",
            options.detected_address
        ))?;
        let host = parse_host_answer(&answer, options.detected_address)?;
        config.set_external_host(&host.to_string());

        let answer = self.deps.prompter.ask(&format!(
            "Assigning {} port address to Ambar, Y to confirm or type in another port...",
            config.fe.external.port_text()
        ))?;
        if let Some(port) = parse_port_answer(&answer)? {
            config.set_external_port(port);
        }

        config.enrich();
        self.store.persist(&config)?;
        fsutil::write_atomic(&self.layout.template_path(), template.as_bytes())?;
        self.render_descriptor(&config)?;
        self.pull_images(&config).await?;
        let appended = tuning::apply_persistent(self.deps.kernel.as_ref()).await?;

        tracing::info!(
            host = %host,
            port = %config.fe.external.port_text(),
            tuned = appended.len(),
            "Ambar installed"
        );
        Ok(ActionReport::completed(Action::Install))
    }

    /// Apply live tuning, re-render, bring services up and optionally wait
    /// for the frontend.
    pub async fn start(&self, wait: WaitPolicy) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Start)?;
        let config = self.store.load_persisted()?;
        self.start_services(&config, wait, Action::Start).await
    }

    /// Remove worker containers and bring the stack down.
    ///
    /// Never fails once the configuration is loaded; failed steps are
    /// reported as warnings.
    pub async fn stop(&self) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Stop)?;
        let config = self.store.load_persisted()?;
        let mut report = ActionReport::completed(Action::Stop);
        report.warnings = self.teardown(&config).await;
        Ok(report)
    }

    pub async fn restart(&self, wait: WaitPolicy) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Restart)?;
        let config = self.store.load_persisted()?;
        let warnings = self.teardown(&config).await;
        let mut report = self.start_services(&config, wait, Action::Restart).await?;
        report.warnings = warnings;
        Ok(report)
    }

    /// Stop, fetch the latest template, re-render, pull and start.
    pub async fn update(&self, wait: WaitPolicy) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Update)?;
        let config = self.store.load_persisted()?;
        let warnings = self.teardown(&config).await;

        let template = self
            .deps
            .fetcher
            .fetch(&config.docker_compose_template)
            .await?;
        fsutil::write_atomic(&self.layout.template_path(), template.as_bytes())?;
        self.render_descriptor(&config)?;
        self.pull_images(&config).await?;

        let mut report = self.start_services(&config, wait, Action::Update).await?;
        report.warnings = warnings;
        Ok(report)
    }

    /// Stop and delete the data directory, keeping the configuration.
    pub async fn reset(&self) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Reset)?;
        let config = self.store.load_persisted()?;

        let question = format!(
            "All data from Ambar will be removed ({}). Are you sure? (y/n)",
            config.data_path
        );
        if !self.confirm(&question)? {
            return Ok(ActionReport::cancelled(Action::Reset, self.status()));
        }

        let mut report = ActionReport::completed(Action::Reset);
        report.warnings = self.teardown(&config).await;
        fsutil::remove_data_tree(Path::new(&config.data_path))?;
        Ok(report)
    }

    /// Stop, delete the data directory and every file this tool wrote.
    pub async fn uninstall(&self) -> AmbarResult<ActionReport> {
        let _lock = self.begin(Action::Uninstall)?;
        let config = self.store.load_persisted()?;

        let question = format!(
            "Ambar will be uninstalled and all data will be removed ({}). Are you sure? (y/n)",
            config.data_path
        );
        if !self.confirm(&question)? {
            return Ok(ActionReport::cancelled(Action::Uninstall, self.status()));
        }

        let mut report = ActionReport::completed(Action::Uninstall);
        report.warnings = self.teardown(&config).await;
        fsutil::remove_data_tree(Path::new(&config.data_path))?;
        self.store.remove()?;
        fsutil::remove_file_if_exists(&self.layout.template_path())?;
        fsutil::remove_file_if_exists(&self.layout.descriptor_path())?;
        tracing::info!(home = %self.layout.home_dir().display(), "Ambar uninstalled");
        Ok(report)
    }

    // ========================================================================
    // STEPS (caller holds the lock)
    // ========================================================================

    fn confirm(&self, question: &str) -> AmbarResult<bool> {
        let answer = self.deps.prompter.ask(question)?;
        let confirmed = is_confirmed(&answer);
        if !confirmed {
            tracing::info!("Operator declined, nothing changed");
        }
        Ok(confirmed)
    }

    fn render_descriptor(&self, config: &Configuration) -> AmbarResult<()> {
        render::render_to(
            &self.layout.template_path(),
            &self.layout.descriptor_path(),
            config,
        )
    }

    async fn pull_images(&self, config: &Configuration) -> AmbarResult<()> {
        for image in [compose::CRAWLER_IMAGE, compose::PIPELINE_IMAGE] {
            let reference = format!("{}:{}", config.worker_image(image), compose::WORKER_TAG);
            tracing::info!(image = %reference, "Pulling image");
            self.deps.runtime.pull_image(&reference).await?;
        }
        self.deps
            .runtime
            .compose_pull(&self.layout.descriptor_path(), compose::PROJECT)
            .await
    }

    async fn start_services(
        &self,
        config: &Configuration,
        wait: WaitPolicy,
        action: Action,
    ) -> AmbarResult<ActionReport> {
        tuning::apply_live(self.deps.kernel.as_ref()).await?;
        self.render_descriptor(config)?;
        self.deps
            .runtime
            .compose_up(&self.layout.descriptor_path(), compose::PROJECT)
            .await?;

        let frontend = config.fe.external.address();
        if let WaitPolicy::Poll { timeout, interval } = wait {
            tracing::info!(url = %frontend, "Waiting for Ambar to start");
            let waited =
                health::wait_until_ready(self.deps.probe.as_ref(), &frontend, timeout, interval)
                    .await?;
            tracing::info!(elapsed_ms = waited.as_millis() as u64, "Frontend is up");
        }

        let mut report = ActionReport::completed(action);
        report.frontend = Some(frontend);
        Ok(report)
    }

    /// Best-effort removal of worker containers followed by compose down.
    async fn teardown(&self, config: &Configuration) -> Vec<StepWarning> {
        let mut warnings = Vec::new();
        let runtime = self.deps.runtime.as_ref();

        for image in [compose::CRAWLER_IMAGE, compose::PIPELINE_IMAGE] {
            let ancestor = config.worker_image(image);
            let step = format!("remove {ancestor} containers");
            match runtime.list_containers_by_ancestor(&ancestor).await {
                Ok(ids) => {
                    if let Err(e) = runtime.remove_containers(&ids).await {
                        tracing::warn!(ancestor = %ancestor, error = %e, "Failed to remove containers");
                        warnings.push(StepWarning::new(step, e));
                    } else {
                        tracing::info!(ancestor = %ancestor, count = ids.len(), "Containers removed");
                    }
                }
                Err(e) => {
                    tracing::warn!(ancestor = %ancestor, error = %e, "Failed to list containers");
                    warnings.push(StepWarning::new(step, e));
                }
            }
        }

        if let Err(e) = runtime
            .compose_down(&self.layout.descriptor_path(), compose::PROJECT)
            .await
        {
            tracing::warn!(error = %e, "compose down failed");
            warnings.push(StepWarning::new("compose down", e));
        } else {
            tracing::info!("Ambar is stopped");
        }
        warnings
    }
}
