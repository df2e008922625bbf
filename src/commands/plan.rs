//! Command: show what a run would dispatch, without loading any module.
use std::path::{Path, PathBuf};

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Log;
use crate::modules::native::NativeModuleLoader;
use crate::modules::{ModuleLoader, ModuleUnit};
use crate::operations::SystemFileSystemOps;

/// Whether one declared section has a customisation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    /// Section header.
    pub section: String,
    /// Logical configuration file name.
    pub logical_name: String,
    /// Customisation source, if one is indexed.
    pub source: Option<PathBuf>,
}

/// Module candidates and section matches for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Module candidates in dispatch order.
    pub modules: Vec<ModuleUnit>,
    /// Every declared section in registry order.
    pub sections: Vec<SectionMatch>,
}

impl Plan {
    /// Number of sections that would be handed to a module.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.sections.iter().filter(|s| s.source.is_some()).count()
    }

    /// Render the plan as report lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.modules.len() + self.sections.len() + 1);
        lines.extend(self.modules.iter().map(|m| format!("module {m}")));
        lines.extend(self.sections.iter().map(|s| match &s.source {
            Some(path) => format!("[{}] {} <- {}", s.section, s.logical_name, path.display()),
            None => format!("[{}] {} (no customisation)", s.section, s.logical_name),
        }));
        lines.push(format!(
            "{} module(s), {} of {} section(s) matched",
            self.modules.len(),
            self.matched(),
            self.sections.len()
        ));
        lines
    }
}

/// Build the plan for `setup`.
///
/// A discovery failure is logged and leaves the module list empty.
#[must_use]
pub fn build(setup: &CommandSetup, loader: &dyn ModuleLoader, log: &dyn Log) -> Plan {
    let modules = loader.discover().unwrap_or_else(|e| {
        log.error(&e.to_string());
        Vec::new()
    });
    let sections = setup
        .sections
        .iter()
        .map(|section| SectionMatch {
            section: section.name().to_string(),
            logical_name: section.logical_name().to_string(),
            source: setup
                .index
                .get(section.logical_name())
                .map(Path::to_path_buf),
        })
        .collect();
    Plan { modules, sections }
}

/// Run the `plan` command.
pub fn run(global: &GlobalOpts, log: &dyn Log) {
    let fs_ops = SystemFileSystemOps;
    let setup = CommandSetup::init(global, &fs_ops, log);
    let loader = NativeModuleLoader::new(&setup.settings.plugin_dir);

    log.stage("Plan");
    for line in build(&setup, &loader, log).lines() {
        log.info(&line);
    }
}
