//! Filesystem abstraction module.
//!
//! This module provides the `FileSystem` trait for abstracting filesystem operations,
//! allowing the document store to run against the real disk or an in-memory map.

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

pub use memory::InMemoryFileSystem;
#[cfg(not(target_arch = "wasm32"))]
pub use native::RealFileSystem;

use std::io::Result;
use std::path::Path;

/// Abstraction over filesystem operations
/// Allows for different implementations: real filesystem, in-memory, etc.
/// Send + Sync required for multi-threaded hosts
pub trait FileSystem: Send + Sync {
    /// Reads the file content
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Overwrites or creates a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Checks if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }
}
