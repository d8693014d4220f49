use ambar_shared::constants::{envs, files};
use ambar_shared::errors::{AmbarError, AmbarResult};
use std::path::{Path, PathBuf};

/// Default home directory name under the user's home.
pub const AMBAR_DIR: &str = ".ambar";

// ============================================================================
// INSTALL LAYOUT (home directory)
// ============================================================================

/// Locations of every file an installation owns.
///
/// ```text
/// <home>/
///   config.json                  persisted configuration
///   docker-compose.template.yml  template fetched at install/update
///   docker-compose.yml           rendered descriptor
///   .lock                        held while an action runs
///   logs/ambar.log
/// ```
#[derive(Clone, Debug)]
pub struct InstallLayout {
    home_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    /// `$AMBAR_HOME`, else `~/.ambar`, else `./.ambar`.
    pub fn default_home() -> PathBuf {
        if let Ok(home) = std::env::var(envs::AMBAR_HOME)
            && !home.is_empty()
        {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(AMBAR_DIR)
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.home_dir.join(files::CONFIG)
    }

    pub fn template_path(&self) -> PathBuf {
        self.home_dir.join(files::TEMPLATE)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.home_dir.join(files::DESCRIPTOR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.home_dir.join(files::LOGS_DIR)
    }

    /// Create the home directory.
    pub fn prepare(&self) -> AmbarResult<()> {
        std::fs::create_dir_all(&self.home_dir)
            .map_err(|e| AmbarError::Storage(format!("failed to create home: {e}")))
    }
}
