//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Tuning knobs for [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Upper bound for acquiring the exclusive advisory lock.
    pub lock_timeout: Duration,
    /// Whether to fsync the temp file before it replaces the target.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Write content atomically to a file with locking.
///
/// The content goes to a sibling temp file first (same directory, so the
/// rename stays on one filesystem), which is then renamed over the target.
/// Readers observe either the old content or the new content, never a mix.
/// Permissions of an existing target are carried over to the replacement.
/// The temp file is removed if any step fails.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let temp_path = temp_path_for(&native_path);

    let result = write_temp(&temp_path, &native_path, content, config).and_then(|()| {
        fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    } else {
        tracing::debug!(path = %path, bytes = content.len(), "Wrote file atomically");
    }

    result
}

/// `.{name}.{pid}.tmp` next to the target.
fn temp_path_for(native_path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    native_path.with_file_name(temp_name)
}

fn write_temp(
    temp_path: &Path,
    native_path: &Path,
    content: &[u8],
    config: RobustnessConfig,
) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    acquire_lock(&temp_file, native_path, config.lock_timeout)?;

    if let Ok(metadata) = fs::metadata(native_path) {
        temp_file
            .set_permissions(metadata.permissions())
            .map_err(|e| Error::io(temp_path, e))?;
    }

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    if config.enable_fsync {
        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }

    FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })
}

/// Take the exclusive lock, backing off exponentially until `timeout`.
fn acquire_lock(file: &File, native_path: &Path, timeout: Duration) -> Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(10))
        .with_max_interval(Duration::from_millis(500))
        .with_max_elapsed_time(Some(timeout))
        .build();

    backoff::retry(policy, || {
        file.try_lock_exclusive()
            .map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file, treating a missing file as `None`.
///
/// Any other failure (permissions, a directory in place of the file,
/// invalid UTF-8) is still an error.
pub fn read_text_optional(path: &NormalizedPath) -> Result<Option<String>> {
    let native_path = path.to_native();
    match fs::read_to_string(&native_path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}
