//! In-memory filesystem implementation.
//!
//! Files live in a shared map, so clones of an `InMemoryFileSystem` see each
//! other's writes. Used by tests and by hosts that hand over document text
//! without a real disk.

use std::collections::HashMap;
use std::io::{self, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::FileSystem;

/// A filesystem backed by a shared in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
    /// When set, every write fails with `PermissionDenied`.
    read_only: Arc<RwLock<bool>>,
}

fn poisoned() -> io::Error {
    io::Error::other("in-memory filesystem lock poisoned")
}

impl InMemoryFileSystem {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder pattern).
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.as_ref().to_path_buf(), content.to_string());
        }
        self
    }

    /// Get the content of a file.
    pub fn get_content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.read().ok()?.get(path.as_ref()).cloned()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_read_only(&self, read_only: bool) {
        if let Ok(mut flag) = self.read_only.write() {
            *flag = read_only;
        }
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .read()
            .map_err(|_| poisoned())?
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if *self.read_only.read().map_err(|_| poisoned())? {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "filesystem is read-only",
            ));
        }
        self.files
            .write()
            .map_err(|_| poisoned())?
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        // Directories are implicit
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_files() {
        let fs = InMemoryFileSystem::new();
        let other = fs.clone();
        fs.write_file(Path::new("a.xml"), "<A/>").unwrap();
        assert!(other.exists(Path::new("a.xml")));
        assert_eq!(other.get_content("a.xml").as_deref(), Some("<A/>"));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let fs = InMemoryFileSystem::new().with_file("a.xml", "<A/>");
        fs.set_read_only(true);
        let err = fs.write_file(Path::new("a.xml"), "<B/>").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(fs.get_content("a.xml").as_deref(), Some("<A/>"));
    }
}
