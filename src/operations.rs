//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that index construction, module
//! discovery and dispatch can be unit-tested without touching the real
//! filesystem.  Production code uses [`SystemFileSystemOps`]; unit tests use
//! `MockFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem queries used by the loader.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file (not a directory or broken symlink).
    fn is_file(&self, path: &Path) -> bool;

    /// Returns the immediate child paths inside `path`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read the whole content of the file at `path`.
    ///
    /// The file handle is released before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// Pre-configure files (with content), unreadable files, and directory
/// listings using the builder-style methods.  Every call to
/// [`FileSystemOps::read`] is recorded and can be inspected with
/// [`reads`](Self::reads).
///
/// # Example
///
/// ```ignore
/// let fs = MockFileSystemOps::new()
///     .with_file("/custom/db.conf", b"port = 5432")
///     .with_unreadable_file("/custom/broken.conf")
///     .with_dir_entries("/custom", vec!["/custom/db.conf".into()]);
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    existing: Vec<PathBuf>,
    contents: std::collections::HashMap<PathBuf, Vec<u8>>,
    unreadable: Vec<PathBuf>,
    dirs: std::collections::HashMap<PathBuf, Vec<PathBuf>>,
    reads: std::sync::Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as a regular file holding `content`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &[u8]) -> Self {
        let p = path.into();
        if !self.existing.contains(&p) {
            self.existing.push(p.clone());
        }
        self.contents.insert(p, content.to_vec());
        self
    }

    /// Mark `path` as a regular file whose reads fail with `PermissionDenied`.
    #[must_use]
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        if !self.existing.contains(&p) {
            self.existing.push(p.clone());
        }
        self.unreadable.push(p);
        self
    }

    /// Set the entries returned by [`FileSystemOps::read_dir`] for `dir`.
    ///
    /// Also marks `dir` itself as existing.
    #[must_use]
    pub fn with_dir_entries(mut self, dir: impl Into<PathBuf>, entries: Vec<PathBuf>) -> Self {
        let d = dir.into();
        if !self.existing.contains(&d) {
            self.existing.push(d.clone());
        }
        self.dirs.insert(d, entries);
        self
    }

    /// Mark `dir` as existing but unlistable.
    #[must_use]
    pub fn with_unlistable_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let d = dir.into();
        if !self.existing.contains(&d) {
            self.existing.push(d);
        }
        self
    }

    /// Paths passed to [`FileSystemOps::read`] so far, in call order.
    #[must_use]
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads
            .lock()
            .map_or_else(|_| Vec::new(), |guard| guard.clone())
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.existing.iter().any(|p| p == path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.contents.contains_key(path) || self.unreadable.iter().any(|p| p == path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.dirs.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock: no entries configured for {}", path.display()),
            )
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Ok(mut guard) = self.reads.lock() {
            guard.push(path.to_path_buf());
        }
        if self.unreadable.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
