//! Customisation index: logical file name to customisation source path.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Mapping from logical file name (a file's base name) to the path of its
/// customisation source.
///
/// Built once per run and read-only afterwards.  Paths are sorted before
/// insertion, so the same input always yields the same index; when two paths
/// share a base name the later one wins and a collision warning is logged.
///
/// ```
/// use configurability::index::CustomisationIndex;
/// use configurability::logging::MemoryLog;
/// use std::path::{Path, PathBuf};
///
/// let log = MemoryLog::new();
/// let index = CustomisationIndex::from_paths(
///     vec![PathBuf::from("/custom/db.conf"), PathBuf::from("/custom/web.conf")],
///     &log,
/// );
/// assert_eq!(index.get("db.conf"), Some(Path::new("/custom/db.conf")));
/// assert_eq!(index.get("missing.conf"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomisationIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl CustomisationIndex {
    /// Build the index from an unordered sequence of file paths.
    ///
    /// Paths without a UTF-8 base name cannot be matched by any section and
    /// are skipped with a debug message.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>, log: &dyn Log) -> Self {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();

        let mut entries = BTreeMap::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                log.debug(&format!("ignoring {}: no usable file name", path.display()));
                continue;
            };
            if let Some(previous) = entries.insert(name.clone(), path.clone()) {
                log.warn(&format!(
                    "customisation {name} provided by both {} and {}; using {}",
                    previous.display(),
                    path.display(),
                    path.display()
                ));
            }
        }
        Self { entries }
    }

    /// List `dir` and index every regular file in it.
    ///
    /// A missing directory is logged at debug level and a listing failure as
    /// a warning; both yield an empty index.
    #[must_use]
    pub fn scan(dir: &Path, fs: &dyn FileSystemOps, log: &dyn Log) -> Self {
        if !fs.exists(dir) {
            log.debug(&format!(
                "customisation directory {} not found",
                dir.display()
            ));
            return Self::default();
        }

        let paths = match fs.read_dir(dir) {
            Ok(paths) => paths,
            Err(e) => {
                log.warn(&format!(
                    "cannot list customisation directory {}: {e}",
                    dir.display()
                ));
                return Self::default();
            }
        };

        let index = Self::from_paths(paths.into_iter().filter(|p| fs.is_file(p)), log);
        log.debug(&format!(
            "{} customisation source(s) in {}",
            index.len(),
            dir.display()
        ));
        index
    }

    /// Path of the customisation source for `logical_name`, if any.
    #[must_use]
    pub fn get(&self, logical_name: &str) -> Option<&Path> {
        self.entries.get(logical_name).map(PathBuf::as_path)
    }

    /// Number of indexed sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(logical name, path)` pairs in name order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }
}
