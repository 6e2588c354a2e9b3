//! Atomic I/O operations on the output directory

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Write content atomically with locking.
///
/// Uses write-to-temp-then-rename so a crashed write never leaves a
/// half-rendered config behind. An advisory lock guards against a second
/// process writing the same path.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file in the same directory, so the rename stays on one filesystem.
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::Lock { path: path.into() })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .unlock()
        .map_err(|_| Error::Lock { path: path.into() })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}

/// Read a file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<()> {
    tracing::debug!(path = %path.display(), "removing file");
    fs::remove_file(path).map_err(|e| Error::io(path, e))
}

/// List regular files in `dir` whose extension matches one of `suffixes`.
///
/// Suffixes are given without the leading dot (`"ini"`, `"json"`).
/// Subdirectories are not descended into; the output directory is flat.
pub fn list_files_with_suffixes(dir: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str());
        if let Some(ext) = ext
            && suffixes.contains(&ext)
        {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}
