//! In-memory [`Log`] implementation.
use std::sync::Mutex;

use super::types::{Level, Log, ModuleEntry, ModuleStatus};

/// Log backend that keeps every message in memory.
///
/// Used where output must be inspected after the fact, most notably by the
/// test suites to check that a failure was reported exactly once.
///
/// ```
/// use configurability::logging::{Level, Log, MemoryLog};
///
/// let log = MemoryLog::new();
/// log.warn("No customisation by /p/a.so");
/// assert_eq!(log.count(Level::Warn), 1);
/// assert!(log.contains(Level::Warn, "/p/a.so"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(Level, String)>>,
    modules: Mutex<Vec<ModuleEntry>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push((level, msg.to_string()));
        }
    }

    /// All messages in emission order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Messages logged at `level`, in emission order.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Number of messages logged at `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.messages(level).len()
    }

    /// Whether any message at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    /// Recorded module outcomes, in order.
    #[must_use]
    pub fn module_entries(&self) -> Vec<ModuleEntry> {
        self.modules.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(Level::Stage, msg);
    }

    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }

    fn record_module(&self, name: &str, status: ModuleStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.modules.lock() {
            guard.push(ModuleEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
