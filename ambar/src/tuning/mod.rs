//! Kernel parameter tuning for the search index and message broker.
//!
//! Two independent operations over [`kernel::PARAMS`]:
//! - [`apply_persistent`] appends wholly missing keys to the boot-time file.
//!   An existing key is never corrected, even when its value differs.
//! - [`apply_live`] re-applies every parameter to the running kernel.
//!
//! Both stop at the first failure.

mod sysctl;

pub use sysctl::SysctlTuner;

use ambar_shared::constants::kernel;
use ambar_shared::errors::{AmbarError, AmbarResult};
use async_trait::async_trait;

/// Access to persisted and live kernel parameters.
#[async_trait]
pub trait KernelTuner: Send + Sync {
    /// Whether `key` appears anywhere in the boot-time file (substring match).
    async fn key_exists_in_persisted_file(&self, key: &str) -> AmbarResult<bool>;

    /// Append a `key=value` line to the boot-time file.
    async fn append_persisted_param(&self, key: &str, value: &str) -> AmbarResult<()>;

    /// Set a parameter on the running kernel.
    async fn apply_live_param(&self, key: &str, value: &str) -> AmbarResult<()>;
}

/// Append every missing parameter to the boot-time file.
///
/// Returns the keys that were appended.
pub async fn apply_persistent(tuner: &dyn KernelTuner) -> AmbarResult<Vec<&'static str>> {
    let mut appended = Vec::new();
    for &(key, value) in kernel::PARAMS {
        let present = tuner
            .key_exists_in_persisted_file(key)
            .await
            .map_err(|e| AmbarError::Tuning(format!("checking {key}: {e}")))?;
        if present {
            tracing::debug!(key, "Kernel parameter already persisted");
            continue;
        }
        tuner
            .append_persisted_param(key, value)
            .await
            .map_err(|e| AmbarError::Tuning(format!("persisting {key}: {e}")))?;
        appended.push(key);
    }
    tracing::info!(appended = ?appended, "Persistent kernel tuning applied");
    Ok(appended)
}

/// Apply every parameter to the running kernel.
pub async fn apply_live(tuner: &dyn KernelTuner) -> AmbarResult<()> {
    for &(key, value) in kernel::PARAMS {
        tuner
            .apply_live_param(key, value)
            .await
            .map_err(|e| AmbarError::Tuning(format!("setting {key}: {e}")))?;
    }
    tracing::info!(count = kernel::PARAMS.len(), "Live kernel tuning applied");
    Ok(())
}
