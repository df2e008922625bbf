//! Core logging types: module outcomes, levels, and the [`Log`] trait.
use std::fmt;

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Verbose diagnostics, hidden on the console unless `--verbose`.
    Debug,
    /// Routine progress.
    Info,
    /// Major section header.
    Stage,
    /// Recoverable or advisory problem.
    Warn,
    /// Failure of one unit of work.
    Error,
}

/// Final outcome of one module in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    /// An invocation reported a successful customisation.
    Customised,
    /// The module ran over every section without customising anything.
    NotCustomised,
    /// The module binary could not be loaded.
    LoadFailed,
    /// The module loaded but its customisation capability was not found.
    Unresolved,
}

impl ModuleStatus {
    /// Whether this outcome is a failure rather than a success or advisory.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::LoadFailed | Self::Unresolved)
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Customised => "customised",
            Self::NotCustomised => "not customised",
            Self::LoadFailed => "load failed",
            Self::Unresolved => "unresolved",
        })
    }
}

/// Module outcome recorded for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Module display name (its path).
    pub name: String,
    /// Final outcome.
    pub status: ModuleStatus,
    /// Optional detail (e.g., the load error).
    pub message: Option<String>,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to `tracing`;
/// [`MemoryLog`](super::memory::MemoryLog) keeps everything in memory so
/// tests can assert on what was reported.  Components receive a `&dyn Log`
/// rather than reaching for a global sink.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a module outcome for the summary.
    fn record_module(&self, name: &str, status: ModuleStatus, message: Option<&str>);
}
