//! Singleton pattern to ensure only one server owns a calendar file.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A lock guard that releases the lock when dropped
pub struct LockGuard {
    _file: File,
}

/// `calendar.json` is guarded by `calendar.json.lock` in the same directory
fn lock_path(data_path: &Path) -> Result<PathBuf> {
    if let Some(dir) = data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }

    let mut name = data_path.as_os_str().to_owned();
    name.push(".lock");
    Ok(PathBuf::from(name))
}

/// Acquire an exclusive lock on the calendar file, failing if another
/// server already holds it
pub fn acquire_lock(data_path: &Path) -> Result<LockGuard> {
    let path = lock_path(data_path)?;
    let file = File::create(&path).context("Failed to create lock file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another calendrier-server instance is already using {}.\n\
            If you believe this is an error, remove: {}",
            data_path.display(),
            path.display()
        )
    })?;

    Ok(LockGuard { _file: file })
}
