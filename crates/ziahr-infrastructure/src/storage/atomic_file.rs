//! Atomic file writes for the storage area.
//!
//! Every value is written to a temporary file in the same directory, synced,
//! then renamed over the target, so a reader never sees a half-written value.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use ziahr_core::error::{Result, ZiahrError};

/// A handle to a single file that is always replaced atomically.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: the file content
    /// - `Ok(None)`: the file doesn't exist or is empty
    /// - `Err`: the file exists but could not be read
    pub fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(content))
    }

    /// Replaces the file content atomically.
    ///
    /// An exclusive lock is held for the duration of the write so two
    /// processes never interleave on the temporary file.
    pub fn write(&self, content: &str) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write_unlocked(content)
    }

    /// Performs a read-modify-write under the file lock.
    ///
    /// `f` receives the current content (`None` if missing) and returns the
    /// new content.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Option<String>) -> Result<String>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let current = self.read()?;
        let next = f(current)?;
        self.write_unlocked(&next)
    }

    /// Deletes the file. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_unlocked(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ZiahrError::io("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ZiahrError::io("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| ZiahrError::storage(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the handle closes; the lock file is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("value.json"));

        file.write("[1,2,3]").unwrap();
        assert_eq!(file.read().unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_read_missing_and_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("missing.json"));
        assert!(file.read().unwrap().is_none());

        fs::write(file.path(), "   ").unwrap();
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("value.json");
        let file = AtomicFile::new(path.clone());

        file.write("{}").unwrap();

        assert!(!temp_dir.path().join(".value.json.tmp").exists());
        assert!(!temp_dir.path().join("value.lock").exists());
        assert!(path.exists());
    }

    #[test]
    fn test_update_sees_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("counter.json"));

        for _ in 0..3 {
            file.update(|current| {
                let n: u32 = current.and_then(|c| c.parse().ok()).unwrap_or(0);
                Ok((n + 1).to_string())
            })
            .unwrap();
        }

        assert_eq!(file.read().unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("gone.json"));
        file.remove().unwrap();
    }
}
