//! Declared configuration sections and the registry that holds them.
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::ini::{self, KvSection};
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Setting that names the configuration file a section customises.
pub const FILE_NAME_KEY: &str = "configuration_file_name";

/// Extension of the files read from the configuration store.
pub const STORE_EXTENSION: &str = "ini";

/// One declared configuration domain on the host.
///
/// The logical name is the value of the [`FILE_NAME_KEY`] setting and is the
/// key used to look up a customisation source.  All settings, including that
/// one, are passed through untouched to the module that customises it.
///
/// # Examples
///
/// ```
/// use configurability::config::sections::ConfigurationSection;
///
/// let section = ConfigurationSection::new(
///     "database",
///     vec![
///         ("configuration_file_name".to_string(), "db.conf".to_string()),
///         ("owner".to_string(), "postgres".to_string()),
///     ],
/// )
/// .unwrap();
/// assert_eq!(section.logical_name(), "db.conf");
/// assert_eq!(section.get("owner"), Some("postgres"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSection {
    name: String,
    logical_name: String,
    settings: Vec<(String, String)>,
}

impl ConfigurationSection {
    /// Build a section from its header and settings.
    ///
    /// Returns `None` when no non-empty [`FILE_NAME_KEY`] setting is present.
    /// When the key is repeated, the last occurrence wins.
    #[must_use]
    pub fn new(name: impl Into<String>, settings: Vec<(String, String)>) -> Option<Self> {
        let logical_name = settings
            .iter()
            .rev()
            .find(|(k, _)| k == FILE_NAME_KEY)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())?;
        Some(Self {
            name: name.into(),
            logical_name,
            settings,
        })
    }

    /// Convert a parsed INI section, see [`ConfigurationSection::new`].
    #[must_use]
    pub fn from_kv(section: KvSection) -> Option<Self> {
        Self::new(section.header, section.entries)
    }

    /// Section header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical configuration file name this section customises.
    #[must_use]
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// All settings in declaration order.
    #[must_use]
    pub fn settings(&self) -> &[(String, String)] {
        &self.settings
    }

    /// Value of `key`; the last occurrence wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the section back to INI text, as handed to native modules.
    ///
    /// Values are quoted where needed so that parsing the text again yields
    /// the same settings.
    ///
    /// ```
    /// use configurability::config::sections::ConfigurationSection;
    ///
    /// let section = ConfigurationSection::new(
    ///     "db",
    ///     vec![("configuration_file_name".to_string(), "db.conf".to_string())],
    /// )
    /// .unwrap();
    /// assert_eq!(section.to_ini_string(), "[db]\nconfiguration_file_name = db.conf\n");
    /// ```
    #[must_use]
    pub fn to_ini_string(&self) -> String {
        let mut out = format!("[{}]\n", self.name);
        for (key, value) in &self.settings {
            let _ = writeln!(out, "{key} = {}", ini::quote_value(value));
        }
        out
    }
}

/// The ordered, read-only set of sections declared on the host.
///
/// Files in the configuration store are read in lexical path order and
/// sections keep their order within each file, so iteration order is stable
/// for a given store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionRegistry {
    sections: Vec<ConfigurationSection>,
}

impl SectionRegistry {
    /// Wrap an already-built list of sections.
    #[must_use]
    pub const fn from_sections(sections: Vec<ConfigurationSection>) -> Self {
        Self { sections }
    }

    /// Read every `*.ini` file in `dir` and collect the sections that name a
    /// configuration file.
    ///
    /// Other files, such as editor or package-manager backups, are ignored.
    ///
    /// Unreadable or malformed files and sections without
    /// [`FILE_NAME_KEY`] are skipped with a debug message; they never abort
    /// the run.  A missing directory yields an empty registry.
    #[must_use]
    pub fn load(dir: &Path, fs: &dyn FileSystemOps, log: &dyn Log) -> Self {
        if !fs.exists(dir) {
            log.debug(&format!(
                "configuration store {} not found",
                dir.display()
            ));
            return Self::default();
        }

        let mut paths: Vec<PathBuf> = match fs.read_dir(dir) {
            Ok(paths) => paths,
            Err(e) => {
                log.warn(&format!(
                    "cannot list configuration store {}: {e}",
                    dir.display()
                ));
                return Self::default();
            }
        };
        paths.retain(|p| {
            p.extension() == Some(std::ffi::OsStr::new(STORE_EXTENSION)) && fs.is_file(p)
        });
        paths.sort();

        let mut sections = Vec::new();
        for path in &paths {
            let parsed = match ini::parse_kv_sections(path, fs) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log.debug(&format!("skipping {}: {e}", path.display()));
                    continue;
                }
            };
            for kv in parsed {
                let header = kv.header.clone();
                match ConfigurationSection::from_kv(kv) {
                    Some(section) => sections.push(section),
                    None => log.debug(&format!(
                        "skipping [{header}] in {}: no {FILE_NAME_KEY}",
                        path.display()
                    )),
                }
            }
        }

        log.debug(&format!(
            "{} configuration section(s) declared in {}",
            sections.len(),
            dir.display()
        ));
        Self { sections }
    }

    /// Iterate sections in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigurationSection> {
        self.sections.iter()
    }

    /// Sections in registry order.
    #[must_use]
    pub fn as_slice(&self) -> &[ConfigurationSection] {
        &self.sections
    }

    /// Number of declared sections.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if no sections are declared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl<'a> IntoIterator for &'a SectionRegistry {
    type Item = &'a ConfigurationSection;
    type IntoIter = std::slice::Iter<'a, ConfigurationSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
