//! In-memory mock filesystem for testing collectors without a Lustre server.
//!
//! `MockFs` simulates the `/proc/fs/lustre` and debugfs trees in memory so
//! the whole collection cycle can be exercised in CI.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, Vec<u8>>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Paths that stay listed but fail to read or list.
    failures: HashMap<PathBuf, io::ErrorKind>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, simulating a target or export that went away.
    ///
    /// Returns `true` if the file existed.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        self.files.remove(path.as_ref()).is_some()
    }

    /// Makes reading or listing `path` fail with `kind` while it is still
    /// returned by the listing of its parent.
    ///
    /// Simulates a file that vanishes between expansion and read, or a
    /// directory the collector may not enter.
    pub fn fail_path(&mut self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.failures.insert(path.as_ref().to_path_buf(), kind);
    }

    fn injected_failure(&self, path: &Path) -> io::Result<()> {
        match self.failures.get(path) {
            Some(&kind) => Err(io::Error::new(kind, format!("injected failure: {:?}", path))),
            None => Ok(()),
        }
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.injected_failure(path)?;
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.injected_failure(path)?;
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
