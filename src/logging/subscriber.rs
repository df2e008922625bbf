//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::{IsTerminal as _, Write as _};
use std::path::Path;
use std::sync::Mutex;

use super::utils::{Stamp, plain};
use crate::commands::version::VERSION;
use crate::error::LoggingError;

const STAGE_TARGET: &str = "configurability::stage";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends all events to the log file
/// with timestamps and ANSI codes stripped.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open (or create) `path` for appending and write a run header.
    ///
    /// Existing content is kept; each run appends below its own header.
    pub(super) fn open(path: &Path) -> Result<Self, LoggingError> {
        let open_err = |source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        write!(
            file,
            "==========================================\n\
             Configurability {VERSION} {}\n\
             ==========================================\n",
            Stamp::Header.now(),
        )
        .map_err(open_err)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = plain(&extractor.message);
        let ts = Stamp::Line.now();

        let line = match (level, target) {
            (tracing::Level::INFO, STAGE_TARGET) => format!("[{ts}] ==> {msg}"),
            (tracing::Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
            (tracing::Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
            (tracing::Level::DEBUG | tracing::Level::TRACE, _) => {
                format!("[{ts}]     [debug] {msg}")
            }
            _ => format!("[{ts}]     {msg}"),
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits one plain line per
/// event, coloured only when writing to a terminal.
struct ConsoleFormatter {
    ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let line = match level {
            tracing::Level::ERROR => format!("\x1b[31mERROR\x1b[0m {}", extractor.message),
            tracing::Level::WARN => format!("\x1b[33mWARN\x1b[0m  {}", extractor.message),
            tracing::Level::INFO if target == STAGE_TARGET => {
                format!("\x1b[1;34m==>\x1b[0m \x1b[1m{}\x1b[0m", extractor.message)
            }
            tracing::Level::INFO => format!("  {}", extractor.message),
            _ => format!("  \x1b[2m{}\x1b[0m", extractor.message),
        };

        if self.ansi {
            writeln!(writer, "{line}")
        } else {
            writeln!(writer, "{}", plain(&line))
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Every event goes to standard output as one plain-text line; `debug`
/// events only with `verbose`.  When `log_file` is given, every event
/// (including `debug`) is also appended there.  Must be called once at
/// program startup, before any logging.
///
/// # Errors
///
/// Returns [`LoggingError::Open`] if `log_file` cannot be opened for
/// appending and [`LoggingError::AlreadyInitialised`] if a global subscriber
/// is already installed.  Both are fatal for the run.
pub fn init_subscriber(verbose: bool, log_file: Option<&Path>) -> Result<(), LoggingError> {
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter {
            ansi: std::io::stdout().is_terminal(),
        })
        .with_writer(std::io::stdout)
        .with_filter(console_level);

    let file_layer = log_file
        .map(FileLayer::open)
        .transpose()?
        .map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialised(e.to_string()))
}
