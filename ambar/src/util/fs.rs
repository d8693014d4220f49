//! Filesystem helpers with replace-or-nothing semantics.

use ambar_shared::errors::{AmbarError, AmbarResult};
use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Mode of every file [`write_atomic`] produces. Temp files start at 0600.
pub const FILE_MODE: u32 = 0o644;

/// Write `contents` to `path` through a sibling temp file and rename.
///
/// Readers see either the previous file or the complete new one, never a
/// truncated mix.
pub fn write_atomic(path: &Path, contents: &[u8]) -> AmbarResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| AmbarError::Storage(format!("failed to create {}: {}", dir.display(), e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| AmbarError::Storage(format!("failed to create temp file: {e}")))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().set_permissions(Permissions::from_mode(FILE_MODE)))
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| AmbarError::Storage(format!("failed to write {}: {}", path.display(), e)))?;
    tmp.persist(path).map_err(|e| {
        AmbarError::Storage(format!("failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

/// Remove a file; a missing file counts as removed.
pub fn remove_file_if_exists(path: &Path) -> AmbarResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AmbarError::Storage(format!(
            "failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Recursively delete a data directory.
///
/// Refuses relative paths and the filesystem root. A missing directory
/// counts as removed.
pub fn remove_data_tree(path: &Path) -> AmbarResult<()> {
    if !path.is_absolute() || path.parent().is_none() {
        return Err(AmbarError::InvalidArgument(format!(
            "refusing to delete data path '{}': must be an absolute, non-root directory",
            path.display()
        )));
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Removed data directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AmbarError::Storage(format!(
            "failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}
