//! Loading, enriching and persisting the configuration file.

use super::Configuration;
use crate::fetch::Fetcher;
use crate::util::fs as fsutil;
use ambar_shared::errors::{AmbarError, AmbarResult};
use std::path::{Path, PathBuf};

/// Where `install` obtains its configuration from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// The persisted file in the install home.
    Local,
    /// Download from this URL.
    Remote(String),
}

/// Parse configuration text without enrichment.
pub fn parse(text: &str) -> AmbarResult<Configuration> {
    serde_json::from_str(text).map_err(|e| AmbarError::ConfigMalformed(e.to_string()))
}

/// Reads and writes the persisted configuration file.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Obtain configuration from `source` without deriving public URIs.
    pub async fn load_raw(
        &self,
        source: &ConfigSource,
        fetcher: &dyn Fetcher,
    ) -> AmbarResult<Configuration> {
        match source {
            ConfigSource::Local => self.read_persisted(),
            ConfigSource::Remote(url) => {
                tracing::info!(url = %url, "Fetching configuration");
                let text = fetcher
                    .fetch(url)
                    .await
                    .map_err(|e| AmbarError::ConfigUnavailable(e.to_string()))?;
                parse(&text)
            }
        }
    }

    /// Obtain configuration from `source` and enrich it.
    pub async fn load(
        &self,
        source: &ConfigSource,
        fetcher: &dyn Fetcher,
    ) -> AmbarResult<Configuration> {
        let mut config = self.load_raw(source, fetcher).await?;
        config.enrich();
        Ok(config)
    }

    /// Load the persisted file and enrich it.
    ///
    /// Every action except `install` goes through here.
    pub fn load_persisted(&self) -> AmbarResult<Configuration> {
        let mut config = self.read_persisted()?;
        config.enrich();
        Ok(config)
    }

    fn read_persisted(&self) -> AmbarResult<Configuration> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AmbarError::ConfigInvalid(format!(
                    "no configuration at {}; run `ambar install` first",
                    self.path.display()
                )));
            }
            Err(e) => {
                return Err(AmbarError::Storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        parse(&text)
    }

    /// Serialize the full configuration and atomically replace the file.
    pub fn persist(&self, config: &Configuration) -> AmbarResult<()> {
        let mut text = serde_json::to_string_pretty(config)
            .map_err(|e| AmbarError::Internal(format!("failed to serialize config: {e}")))?;
        text.push('\n');
        fsutil::write_atomic(&self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "Persisted configuration");
        Ok(())
    }

    /// Delete the persisted file. A missing file is not an error.
    pub fn remove(&self) -> AmbarResult<()> {
        fsutil::remove_file_if_exists(&self.path)
    }
}
