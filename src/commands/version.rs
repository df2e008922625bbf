//! Command: print version information.
use crate::logging::Log;

/// Version embedded at build time, or the crate version for local builds.
pub const VERSION: &str = match option_env!("CONFIGURABILITY_VERSION") {
    Some(version) => version,
    None => concat!("dev-", env!("CARGO_PKG_VERSION")),
};

/// Report the configurability version.
pub fn run(log: &dyn Log) {
    log.info(&format!("configurability {VERSION}"));
}
