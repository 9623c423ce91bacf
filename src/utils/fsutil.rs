use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Name prefix of in-flight staging files. Anything carrying it that survives a crash is debris.
pub const STAGING_PREFIX: &str = ".diskcache-staging-";

fn staging_file(dir: &Path) -> io::Result<NamedTempFile> {
    let staged = Builder::new().prefix(STAGING_PREFIX).tempfile_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(staged)
}

/// Stage `bytes` in an owner-only temp file inside `dir`, then atomically rename it to `dir/name`.
/// The destination holds either its previous contents or all of `bytes`, never a partial write.
///
/// # Errors
/// Returns the staging or rename failure.
pub fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> crate::errors::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut staged = staging_file(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_data()?;
    let dest = dir.join(name);
    staged.persist(&dest)?;
    Ok(dest)
}

/// Delete staging files left in `dir` by an interrupted write. Returns how many were removed.
///
/// # Errors
/// Returns the first failure to list the directory or delete a leftover.
pub fn sweep_staging(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX)
            && entry.file_type()?.is_file()
            && remove_file_if_exists(&entry.path())?
        {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Remove a file; a missing file is not an error. Returns whether something was removed.
///
/// # Errors
/// Returns any failure other than `NotFound`.
pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Recursively remove a directory; a missing directory is not an error.
///
/// # Errors
/// Returns any failure other than `NotFound`.
pub fn remove_dir_all_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
