//! `sysctl`-backed [`KernelTuner`].

use super::KernelTuner;
use crate::util::process;
use ambar_shared::constants::kernel;
use ambar_shared::errors::{AmbarError, AmbarResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Persists to a sysctl configuration file and applies with `sysctl -w`.
#[derive(Clone, Debug)]
pub struct SysctlTuner {
    conf_path: PathBuf,
    sysctl: String,
}

impl Default for SysctlTuner {
    fn default() -> Self {
        Self::new(PathBuf::from(kernel::SYSCTL_CONF))
    }
}

impl SysctlTuner {
    pub fn new(conf_path: PathBuf) -> Self {
        Self {
            conf_path,
            sysctl: "sysctl".to_string(),
        }
    }

    /// Use a different `sysctl` executable.
    pub fn with_sysctl(mut self, program: impl Into<String>) -> Self {
        self.sysctl = program.into();
        self
    }

    async fn read_conf(&self) -> AmbarResult<String> {
        match tokio::fs::read_to_string(&self.conf_path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AmbarError::Storage(format!(
                "failed to read {}: {}",
                self.conf_path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl KernelTuner for SysctlTuner {
    async fn key_exists_in_persisted_file(&self, key: &str) -> AmbarResult<bool> {
        Ok(self.read_conf().await?.contains(key))
    }

    async fn append_persisted_param(&self, key: &str, value: &str) -> AmbarResult<()> {
        let existing = self.read_conf().await?;
        let mut line = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&format!("{key}={value}\n"));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.conf_path)
            .await
            .map_err(|e| {
                AmbarError::Storage(format!(
                    "failed to open {}: {}",
                    self.conf_path.display(),
                    e
                ))
            })?;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            AmbarError::Storage(format!(
                "failed to append to {}: {}",
                self.conf_path.display(),
                e
            ))
        })?;
        file.flush()
            .await
            .map_err(|e| AmbarError::Storage(format!("failed to flush sysctl file: {e}")))?;
        Ok(())
    }

    async fn apply_live_param(&self, key: &str, value: &str) -> AmbarResult<()> {
        // The persisted form quotes multi-word values; argv does not need quoting.
        let value = value.trim_matches('"');
        let assignment = format!("{key}={value}");
        process::run_strict(&self.sysctl, &process::args(["-w".to_string(), assignment])).await
    }
}
