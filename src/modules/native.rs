//! Shared-object modules loaded with [`libloading`].
//!
//! A module is any `*.so` in the module directory exporting a C-ABI
//! `Customise` symbol.  Buffers handed to it are only valid for the call;
//! the section is passed as INI text.
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use libloading::{Library, Symbol};

use super::{CUSTOMISE_SYMBOL, Customise, Module, ModuleLoader, ModuleUnit};
use crate::config::sections::ConfigurationSection;
use crate::error::ModuleError;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// File extension of loadable modules.
pub const MODULE_EXTENSION: &str = "so";

/// C signature of the exported capability.
type CustomiseFn = unsafe extern "C" fn(
    content: *const u8,
    content_len: usize,
    section: *const u8,
    section_len: usize,
    file_name: *const u8,
    file_name_len: usize,
) -> bool;

/// Discovers and loads shared objects from one directory.
#[derive(Debug)]
pub struct NativeModuleLoader {
    plugin_dir: PathBuf,
    fs_ops: Arc<dyn FileSystemOps>,
}

impl NativeModuleLoader {
    /// Create a loader for `plugin_dir` backed by the real filesystem.
    #[must_use]
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            fs_ops: Arc::new(SystemFileSystemOps),
        }
    }

    /// Replace the filesystem used for discovery.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }
}

impl ModuleLoader for NativeModuleLoader {
    fn discover(&self) -> Result<Vec<ModuleUnit>, ModuleError> {
        if !self.fs_ops.exists(&self.plugin_dir) {
            return Ok(Vec::new());
        }
        let entries =
            self.fs_ops
                .read_dir(&self.plugin_dir)
                .map_err(|source| ModuleError::Discovery {
                    dir: self.plugin_dir.clone(),
                    source,
                })?;
        let mut units: Vec<ModuleUnit> = entries
            .into_iter()
            .filter(|p| p.extension() == Some(OsStr::new(MODULE_EXTENSION)))
            .filter(|p| self.fs_ops.is_file(p))
            .map(ModuleUnit::new)
            .collect();
        units.sort();
        Ok(units)
    }

    fn load(&self, unit: &ModuleUnit) -> Result<Box<dyn Module>, ModuleError> {
        // SAFETY: loading runs the library's initialisers. Modules in the
        // module directory are trusted to be well-behaved shared objects.
        #[allow(unsafe_code)]
        let library = unsafe { Library::new(&unit.path) }.map_err(|e| ModuleError::Load {
            module: unit.to_string(),
            source: Box::new(e),
        })?;
        Ok(Box::new(NativeModule {
            unit: unit.clone(),
            library,
        }))
    }
}

/// A loaded shared object.
#[derive(Debug)]
pub struct NativeModule {
    unit: ModuleUnit,
    library: Library,
}

impl Module for NativeModule {
    fn resolve(&self) -> Result<Box<dyn Customise + '_>, ModuleError> {
        let name = format!("{CUSTOMISE_SYMBOL}\0");
        // SAFETY: `CustomiseFn` is the documented module ABI. The symbol
        // borrows `self.library`, so it cannot outlive the mapping.
        #[allow(unsafe_code)]
        let symbol = unsafe { self.library.get::<CustomiseFn>(name.as_bytes()) }.map_err(|e| {
            ModuleError::Unresolved {
                module: self.unit.to_string(),
                symbol: CUSTOMISE_SYMBOL.to_string(),
                source: Box::new(e),
            }
        })?;
        Ok(Box::new(NativeCustomiser { symbol }))
    }
}

struct NativeCustomiser<'lib> {
    symbol: Symbol<'lib, CustomiseFn>,
}

impl fmt::Debug for NativeCustomiser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeCustomiser").finish_non_exhaustive()
    }
}

impl Customise for NativeCustomiser<'_> {
    fn customise(&self, content: &[u8], section: &ConfigurationSection, file_name: &str) -> bool {
        call_customise(*self.symbol, content, section, file_name)
    }
}

/// Hand `content`, the rendered `section` and `file_name` to `customise` as
/// pointer/length pairs.
#[allow(unsafe_code)]
fn call_customise(
    customise: CustomiseFn,
    content: &[u8],
    section: &ConfigurationSection,
    file_name: &str,
) -> bool {
    let section = section.to_ini_string();
    // SAFETY: every pointer/length pair describes a live buffer that
    // outlives the call; the module must not retain them afterwards.
    unsafe {
        customise(
            content.as_ptr(),
            content.len(),
            section.as_ptr(),
            section.len(),
            file_name.as_ptr(),
            file_name.len(),
        )
    }
}
