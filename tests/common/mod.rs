// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed host layout (configuration store,
// customisation directory, module directory), a fluent builder to populate
// it, and a scripted in-memory module loader so the run loop can be
// exercised without compiled modules.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use configurability::commands::CommandSetup;
use configurability::config::Settings;
use configurability::config::sections::ConfigurationSection;
use configurability::error::ModuleError;
use configurability::logging::MemoryLog;
use configurability::modules::{Customise, Module, ModuleLoader, ModuleUnit};
use configurability::operations::SystemFileSystemOps;

/// An isolated host layout backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `etc/`     system configuration store (INI files)
/// - `custom/`  customisation sources
/// - `plugins/` module directory
pub struct IntegrationTestContext {
    /// Temporary directory holding the layout.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create the three (empty) directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for dir in ["etc", "custom", "plugins"] {
            std::fs::create_dir_all(root.path().join(dir)).expect("create layout dir");
        }
        Self { root }
    }

    pub fn etc_dir(&self) -> PathBuf {
        self.root.path().join("etc")
    }

    pub fn custom_dir(&self) -> PathBuf {
        self.root.path().join("custom")
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.root.path().join("plugins")
    }

    /// Settings pointing at this layout.
    pub fn settings(&self) -> Settings {
        Settings {
            plugin_dir: self.plugin_dir(),
            etc_dir: self.etc_dir(),
            customisation_dir: self.custom_dir(),
        }
    }

    /// Build the registry and the index from the real directories.
    pub fn setup(&self, log: &MemoryLog) -> CommandSetup {
        CommandSetup::from_settings(self.settings(), &SystemFileSystemOps, log)
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `etc/<filename>`.
    pub fn with_section_file(self, filename: &str, content: &str) -> Self {
        write(&self.ctx.etc_dir().join(filename), content.as_bytes());
        self
    }

    /// Write `content` to `custom/<filename>`.
    pub fn with_customisation(self, filename: &str, content: &str) -> Self {
        write(&self.ctx.custom_dir().join(filename), content.as_bytes());
        self
    }

    /// Write raw bytes to `plugins/<filename>`.
    pub fn with_plugin_bytes(self, filename: &str, content: &[u8]) -> Self {
        write(&self.ctx.plugin_dir().join(filename), content);
        self
    }

    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn write(path: &Path, content: &[u8]) {
    std::fs::write(path, content).expect("write test file");
}

/// One recorded invocation: module, section header, logical name, content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub module: String,
    pub section: String,
    pub file_name: String,
    pub content: String,
}

/// How a scripted module behaves.
#[derive(Debug, Clone)]
pub enum Script {
    /// Loading fails.
    Broken,
    /// Loads but has no customisation capability.
    NoCapability,
    /// Answers invocations in order; `false` once exhausted.
    Answers(Vec<bool>),
}

/// In-memory [`ModuleLoader`] with scripted modules.
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    modules: Vec<(ModuleUnit, Script)>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: &str, script: Script) -> Self {
        self.modules.push((ModuleUnit::new(path), script));
        self
    }

    /// Every invocation so far, across all modules.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().expect("lock").clone()
    }
}

impl ModuleLoader for ScriptedLoader {
    fn discover(&self) -> Result<Vec<ModuleUnit>, ModuleError> {
        Ok(self.modules.iter().map(|(unit, _)| unit.clone()).collect())
    }

    fn load(&self, unit: &ModuleUnit) -> Result<Box<dyn Module>, ModuleError> {
        let (_, script) = self
            .modules
            .iter()
            .find(|(u, _)| u == unit)
            .expect("unit was discovered");
        if matches!(script, Script::Broken) {
            return Err(ModuleError::Load {
                module: unit.to_string(),
                source: "invalid ELF header".into(),
            });
        }
        Ok(Box::new(ScriptedModule {
            unit: unit.clone(),
            script: script.clone(),
            invocations: Arc::clone(&self.invocations),
        }))
    }
}

#[derive(Debug)]
struct ScriptedModule {
    unit: ModuleUnit,
    script: Script,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl Module for ScriptedModule {
    fn resolve(&self) -> Result<Box<dyn Customise + '_>, ModuleError> {
        let Script::Answers(answers) = &self.script else {
            return Err(ModuleError::Unresolved {
                module: self.unit.to_string(),
                symbol: "Customise".to_string(),
                source: "undefined symbol: Customise".into(),
            });
        };
        Ok(Box::new(ScriptedCustomiser {
            module: self.unit.to_string(),
            answers: Mutex::new(answers.iter().copied().rev().collect()),
            invocations: &self.invocations,
        }))
    }
}

struct ScriptedCustomiser<'a> {
    module: String,
    // Reversed so the next answer is popped from the end.
    answers: Mutex<Vec<bool>>,
    invocations: &'a Mutex<Vec<Invocation>>,
}

impl Customise for ScriptedCustomiser<'_> {
    fn customise(&self, content: &[u8], section: &ConfigurationSection, file_name: &str) -> bool {
        self.invocations.lock().expect("lock").push(Invocation {
            module: self.module.clone(),
            section: section.name().to_string(),
            file_name: file_name.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        });
        self.answers.lock().expect("lock").pop().unwrap_or(false)
    }
}
