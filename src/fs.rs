//! Atomic filesystem operations for fanout.
//!
//! Every mutation of a shared file follows the same pattern: write the new
//! content to a temporary sibling, sync it, then rename it over the target.
//! On POSIX, `rename()` within one filesystem is atomic, so concurrent
//! readers always observe either the old file or the complete new one,
//! never a partial write.
//!
//! On crash, a temporary file (`{filename}.tmp`) may remain; it is
//! overwritten by the next round.

use crate::error::{FanoutError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file.
///
/// Writes to a temporary sibling, syncs to disk, then renames over the
/// target so the target is never observed in a partial state.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = temp_sibling(path)?;

    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)
}

/// Derive the temporary sibling path for a target file.
///
/// The temp file lives in the same directory as the target, which keeps the
/// final rename within one filesystem.
pub fn temp_sibling(target: &Path) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FanoutError::Io(format!("invalid file path: {}", target.display())))?;

    let parent = target.parent().unwrap_or(Path::new("."));
    Ok(parent.join(format!("{}.tmp", file_name)))
}

/// Write content to a file and sync it to disk.
pub fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| FanoutError::Io(format!("failed to create '{}': {}", path.display(), e)))?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        FanoutError::Io(format!("failed to write '{}': {}", path.display(), e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        FanoutError::Io(format!("failed to sync '{}': {}", path.display(), e))
    })
}

/// Atomically replace `target` with `source` via rename.
pub fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        FanoutError::Io(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out.txt");

        atomic_write(&file_path, b"hello world").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "hello world");
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out.txt");
        fs::write(&file_path, "original").unwrap();

        atomic_write(&file_path, b"replacement").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "replacement");
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out.txt");

        atomic_write(&file_path, b"content").unwrap();

        assert!(!temp_dir.path().join("out.txt.tmp").exists());
    }

    #[test]
    fn temp_sibling_stays_in_same_directory() {
        let temp = temp_sibling(Path::new("/shared/task.txt")).unwrap();
        assert_eq!(temp, Path::new("/shared/task.txt.tmp"));
    }
}
