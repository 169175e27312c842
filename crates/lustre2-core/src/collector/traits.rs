//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the collector to work with both the real
//! Lustre `/proc` and debugfs trees and mock implementations for testing on
//! machines without a Lustre server.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for filesystem operations.
///
/// Implementations must be shareable across threads: a collection cycle
/// expands and reads each pattern group on its own worker.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as raw bytes.
    ///
    /// Statistics files may carry job ids that are not valid UTF-8, so
    /// decoding is left to the caller.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// Full paths of the directory entries, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}
