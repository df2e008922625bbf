//! Top-level subcommand orchestration.
pub mod plan;
pub mod run;
pub mod version;

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::config::sections::SectionRegistry;
use crate::index::CustomisationIndex;
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the run settings and builds the section registry and the
/// customisation index once, so `run` and `plan` see the same inputs.
#[derive(Debug)]
pub struct CommandSetup {
    /// Resolved directories.
    pub settings: Settings,
    /// Declared configuration sections.
    pub sections: SectionRegistry,
    /// Available customisation sources.
    pub index: CustomisationIndex,
}

impl CommandSetup {
    /// Resolve settings from `global` and the process environment, then load
    /// the registry and the index.
    #[must_use]
    pub fn init(global: &GlobalOpts, fs_ops: &dyn FileSystemOps, log: &dyn Log) -> Self {
        Self::from_settings(Settings::from_env(global), fs_ops, log)
    }

    /// Load the registry and the index for already-resolved `settings`.
    ///
    /// Never fails: unreadable inputs degrade to empty collections and are
    /// reported through `log`.
    #[must_use]
    pub fn from_settings(settings: Settings, fs_ops: &dyn FileSystemOps, log: &dyn Log) -> Self {
        log.debug(&format!("module directory: {}", settings.plugin_dir.display()));

        log.stage("Reading configuration sections");
        let sections = SectionRegistry::load(&settings.etc_dir, fs_ops, log);
        log.info(&format!(
            "{} section(s) declared in {}",
            sections.len(),
            settings.etc_dir.display()
        ));

        log.stage("Indexing customisations");
        let index = CustomisationIndex::scan(&settings.customisation_dir, fs_ops, log);
        log.info(&format!(
            "{} customisation source(s) in {}",
            index.len(),
            settings.customisation_dir.display()
        ));

        Self {
            settings,
            sections,
            index,
        }
    }
}
