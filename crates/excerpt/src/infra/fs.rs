//! Filesystem helpers for reading source and example files.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

/// Read a text file, refusing binary content and anything that is not UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    if is_probably_binary(path) {
        bail!("refusing to read binary file {}", path.display());
    }
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    String::from_utf8(bytes).map_err(|err| {
        anyhow!(
            "{} is not valid UTF-8 (invalid byte at offset {})",
            path.display(),
            err.utf8_error().valid_up_to()
        )
    })
}

/// Heuristic binary detection over the first kilobyte.
pub fn is_probably_binary(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut buf = [0u8; 1024];
    match file.read(&mut buf) {
        Ok(0) => false,
        Ok(n) => buf[..n].contains(&0),
        Err(_) => false,
    }
}

/// Walk up from `start` to the nearest directory containing `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
