use crate::cache::paths::CacheDirs;
use std::io;
use std::path::Path;

/// Sum of file sizes under `dir`, recursively. A missing directory counts as empty.
///
/// # Errors
/// Returns an error if a directory or file cannot be inspected.
pub fn dir_size(dir: &Path) -> io::Result<u64> {
    let entries = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut total = 0u64;
    for entry in entries {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            total = total.saturating_add(dir_size(&entry.path())?);
        } else if ty.is_file() {
            total = total.saturating_add(entry.metadata()?.len());
        }
    }
    Ok(total)
}

/// Ground-truth payload bytes on disk across both stores, independent of the index.
///
/// # Errors
/// Returns the first I/O failure met while walking.
pub fn cache_size_on_disk(dirs: &CacheDirs) -> io::Result<u64> {
    let mut total = 0u64;
    for dir in dirs.payload_dirs() {
        total = total.saturating_add(dir_size(&dir)?);
    }
    Ok(total)
}
