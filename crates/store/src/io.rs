// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Write-temp-then-rename primitives. The file is the commit point: nothing
//! downstream (events, caches) may observe a write before its rename lands.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::TaskStoreError;

fn io_err(path: &Path, source: std::io::Error) -> TaskStoreError {
    TaskStoreError::Io { path: path.display().to_string(), source }
}

/// Write `contents` to `path` atomically: write to a sibling temp file, then
/// rename over the destination. Creates `path`'s parent directory if absent.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), TaskStoreError> {
    // Allow expect here as callers always pass a path under the vault's status directories
    #[allow(clippy::expect_used)]
    let parent = path.parent().expect("task file path always has a parent");
    fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    let tmp_path = parent.join(format!(".{}.tmp-{}", file_name(path), std::process::id()));
    {
        let mut f = fs::File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        f.write_all(contents.as_bytes()).map_err(|e| io_err(&tmp_path, e))?;
        f.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Move a task file from one status directory to another: write the new
/// contents under `to` with a temp name, rename into place, then unlink
/// `from`. If the process dies between the rename and the unlink, the file
/// briefly exists in both directories; callers must repair this on load by
/// keeping the newer `updatedAt` copy.
pub fn move_atomic(from: &Path, to: &Path, contents: &str) -> Result<(), TaskStoreError> {
    write_atomic(to, contents)?;
    if from != to {
        match fs::remove_file(from) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                // The commit point (the rename into `to`) already succeeded;
                // a failed unlink is a FatalIo per spec §7, repaired on next load.
                tracing::warn!(from = %from.display(), error = %e, "failed to unlink source task file after move");
                return Err(io_err(from, e));
            }
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

#[cfg(test)]
#[path = "io_tests.rs"]
mod tests;
