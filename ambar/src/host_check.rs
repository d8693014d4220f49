//! Host prerequisite checks.
//!
//! Every action needs the docker CLI, a compose command, and root. These
//! checks fail fast with guidance before any file or container is touched.

use crate::runtime::ComposeCommand;
use crate::util::process;
use ambar_shared::constants::urls;
use ambar_shared::errors::{AmbarError, AmbarResult};

/// Result of successful host detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSupport {
    /// Compose invocation to use for this host.
    pub compose: ComposeCommand,
}

/// Verify docker, compose and privileges.
///
/// `compose` forces a compose flavour instead of auto-detecting one.
pub async fn check_host(compose: Option<ComposeCommand>) -> AmbarResult<HostSupport> {
    if !process::probe("docker", &process::args(["-v"])).await {
        return Err(AmbarError::Unsupported(format!(
            "docker is not installed\n\n\
             Suggestions:\n\
             - Install Docker Engine for your distribution\n\
             - Check Ambar requirements here: {}",
            urls::REQUIREMENTS
        )));
    }

    let compose = match compose {
        Some(forced) => forced,
        None => ComposeCommand::detect().await.ok_or_else(|| {
            AmbarError::Unsupported(format!(
                "docker-compose is not installed\n\n\
                 Suggestions:\n\
                 - Install docker-compose or the docker compose plugin\n\
                 - Check Ambar requirements here: {}",
                urls::REQUIREMENTS
            ))
        })?,
    };

    require_root(nix::unistd::Uid::effective().as_raw())?;

    tracing::debug!(compose = ?compose, "Host prerequisites satisfied");
    Ok(HostSupport { compose })
}

fn require_root(euid: u32) -> AmbarResult<()> {
    if euid != 0 {
        return Err(AmbarError::Unsupported(
            "Please run this command as root user (e.g. with sudo)".to_string(),
        ));
    }
    Ok(())
}
