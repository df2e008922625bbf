//! Structured logger with per-module summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{Log, ModuleEntry, ModuleStatus};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record_module` method is **not** included because its signature
/// differs from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Logger that emits `tracing` events and collects module outcomes.
///
/// Console and file output are produced by the subscriber installed with
/// [`init_subscriber`](super::subscriber::init_subscriber); this type only
/// decides which event to emit and remembers the log file path for the
/// summary.
#[derive(Debug, Default)]
pub struct Logger {
    modules: Mutex<Vec<ModuleEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// `log_file` is only displayed in the summary; the file itself is opened
    /// by the subscriber.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            modules: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return a clone of all recorded module entries.
    #[must_use]
    pub fn module_entries(&self) -> Vec<ModuleEntry> {
        self.modules.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "configurability::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file when one is configured).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a module outcome for the summary.
    pub fn record_module(&self, name: &str, status: ModuleStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.modules.lock() {
            guard.push(ModuleEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Print the summary of all recorded modules.
    pub fn print_summary(&self) {
        let modules = self.module_entries();
        if modules.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut customised = 0u32;
        let mut not_customised = 0u32;
        let mut load_failed = 0u32;
        let mut unresolved = 0u32;

        for module in &modules {
            let (icon, color) = match module.status {
                ModuleStatus::Customised => {
                    customised += 1;
                    ("✓", "\x1b[32m")
                }
                ModuleStatus::NotCustomised => {
                    not_customised += 1;
                    ("○", "\x1b[33m")
                }
                ModuleStatus::LoadFailed => {
                    load_failed += 1;
                    ("✗", "\x1b[31m")
                }
                ModuleStatus::Unresolved => {
                    unresolved += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = module
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", module.name));
        }

        let total = customised + not_customised + load_failed + unresolved;
        self.info(&format!(
            "{total} modules: \x1b[32m{customised} customised\x1b[0m, \x1b[33m{not_customised} not customised\x1b[0m, \x1b[31m{load_failed} load failed\x1b[0m, \x1b[31m{unresolved} unresolved\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record_module(&self, name: &str, status: ModuleStatus, message: Option<&str>) {
        self.record_module(name, status, message);
    }
}
