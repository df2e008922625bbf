//! Loadable customisation modules.
//!
//! The run loop only sees three seams:
//!
//! - [`ModuleLoader`] discovers candidate units and loads them,
//! - [`Module`] is one loaded unit whose capability may or may not resolve,
//! - [`Customise`] is the resolved capability that is dispatched.
//!
//! [`native::NativeModuleLoader`] implements them over shared objects; tests
//! substitute in-memory fakes.
pub mod native;

use std::fmt;
use std::path::PathBuf;

use crate::config::sections::ConfigurationSection;
use crate::error::ModuleError;

/// Name of the capability every module must provide.
pub const CUSTOMISE_SYMBOL: &str = "Customise";

/// The customisation capability of a module.
pub trait Customise {
    /// Apply `content` to the configuration described by `section`.
    ///
    /// `file_name` is the section's logical file name.  Returns `true` when
    /// the module customised the file, `false` when it declined.
    fn customise(&self, content: &[u8], section: &ConfigurationSection, file_name: &str) -> bool;
}

/// One loaded module.
pub trait Module: fmt::Debug {
    /// Look up the module's [`Customise`] capability.
    ///
    /// The returned handle borrows the module and cannot outlive it.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Unresolved`] if the module does not provide the
    /// capability.
    fn resolve(&self) -> Result<Box<dyn Customise + '_>, ModuleError>;
}

/// Source of modules for a run.
pub trait ModuleLoader: fmt::Debug {
    /// List candidate units in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Discovery`] if the candidates cannot be listed.
    fn discover(&self) -> Result<Vec<ModuleUnit>, ModuleError>;

    /// Load one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Load`] if the unit cannot be loaded.
    fn load(&self, unit: &ModuleUnit) -> Result<Box<dyn Module>, ModuleError>;
}

/// A discovered module candidate, identified by its path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleUnit {
    /// Location of the module binary.
    pub path: PathBuf,
}

impl ModuleUnit {
    /// Create a unit for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for ModuleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
