//! Command: load every module and apply customisations.
use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::dispatch::{self, DispatchContext, RunReport};
use crate::logging::{Log, Logger, ModuleStatus};
use crate::modules::ModuleLoader;
use crate::modules::native::NativeModuleLoader;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Run the `run` command against the real filesystem and native modules.
///
/// Module, section and customisation problems never fail the command; they
/// are logged and summarised.
pub fn run(global: &GlobalOpts, log: &Logger) {
    let fs_ops = SystemFileSystemOps;
    let setup = CommandSetup::init(global, &fs_ops, log);
    let loader = NativeModuleLoader::new(&setup.settings.plugin_dir);

    let report = execute(&setup, &loader, &fs_ops, log);

    log.print_summary();
    let failed = report
        .outcomes
        .iter()
        .filter(|o| o.status.is_failure())
        .count();
    log.debug(&format!(
        "{} of {} module(s) customised, {failed} failed",
        report.count(ModuleStatus::Customised),
        report.outcomes.len()
    ));
}

/// Dispatch every module from `loader` over the prepared `setup`.
#[must_use]
pub fn execute(
    setup: &CommandSetup,
    loader: &dyn ModuleLoader,
    fs_ops: &dyn FileSystemOps,
    log: &dyn Log,
) -> RunReport {
    log.stage("Dispatching modules");
    let ctx = DispatchContext {
        sections: &setup.sections,
        index: &setup.index,
        fs_ops,
        log,
    };
    dispatch::run_modules(loader, &ctx)
}
