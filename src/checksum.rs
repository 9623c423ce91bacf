//! CRC-32 over raw payload bytes.

use crc32fast::Hasher as Crc32Hasher;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_CHUNK: usize = 64 * 1024;

#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Streams a file through the hasher without holding it in memory.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn crc32_file(path: &Path) -> io::Result<u32> {
    let mut file = File::open(path)?;
    let mut hasher = Crc32Hasher::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
