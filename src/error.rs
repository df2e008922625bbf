//! Domain-specific error types for the configurability loader.
//!
//! Internal modules return typed errors built with [`thiserror`]; the command
//! handlers at the CLI boundary convert them to [`anyhow::Error`] via `?`.
//!
//! # Error kinds
//!
//! ```text
//! ConfigError   : INI parsing and configuration store reads
//! ModuleError   : module discovery, loading, capability lookup
//! LoggingError  : logging destination setup (the only fatal case)
//! ```
//!
//! Only [`LoggingError`] ever reaches the process exit status; every other
//! error is logged where it happens and the run moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used for failures reported by the native loader.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that arise while reading the system configuration store.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The INI file contains a line that cannot be parsed.
    #[error("Invalid INI syntax at line {line}: {message}")]
    InvalidSyntax {
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of the problem, including the offending text.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from module discovery, loading and capability resolution.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// The module directory could not be listed.
    #[error("cannot list module directory {}: {source}", .dir.display())]
    Discovery {
        /// Directory that was being scanned.
        dir: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The module binary could not be loaded.
    #[error("Could not load plugin {module}: {source}")]
    Load {
        /// Display name of the module (its path).
        module: String,
        /// Error reported by the loader.
        source: BoxError,
    },

    /// The module was loaded but does not export the customisation capability.
    #[error("Could not lookup '{symbol}' in {module}: {source}")]
    Unresolved {
        /// Display name of the module (its path).
        module: String,
        /// Name of the capability that was looked up.
        symbol: String,
        /// Error reported by the loader.
        source: BoxError,
    },
}

/// Errors that arise while setting up the logging destination.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The log file could not be created or opened for appending.
    #[error("error opening log file {}: {source}", .path.display())]
    Open {
        /// Requested log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A global subscriber was already installed.
    #[error("logging already initialised: {0}")]
    AlreadyInitialised(String),
}
