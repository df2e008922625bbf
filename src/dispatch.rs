//! Matching sections to customisation sources and dispatching modules.
//!
//! [`dispatch`] runs one resolved module over the section registry;
//! [`run_modules`] drives every discovered module through it and records the
//! outcome of each.
use std::error::Error as _;
use std::fmt;

use crate::config::sections::SectionRegistry;
use crate::index::CustomisationIndex;
use crate::logging::{Log, ModuleStatus};
use crate::modules::{Customise, ModuleLoader, ModuleUnit};
use crate::operations::FileSystemOps;

/// Read-only state shared by every dispatch in a run.
pub struct DispatchContext<'a> {
    /// Declared sections, in dispatch order.
    pub sections: &'a SectionRegistry,
    /// Logical name to customisation source.
    pub index: &'a CustomisationIndex,
    /// Filesystem used to read customisation sources.
    pub fs_ops: &'a dyn FileSystemOps,
    /// Logger for progress and failures.
    pub log: &'a dyn Log,
}

impl fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("sections", &self.sections.len())
            .field("index", &self.index.len())
            .field("fs_ops", &self.fs_ops)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

/// Outcome of one module in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome {
    /// The module candidate.
    pub unit: ModuleUnit,
    /// What happened to it.
    pub status: ModuleStatus,
}

/// Result of [`run_modules`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-module outcomes in discovery order.
    pub outcomes: Vec<ModuleOutcome>,
    /// Whether module discovery itself failed, in which case nothing ran.
    pub discovery_failed: bool,
}

impl RunReport {
    /// Number of modules that ended with `status`.
    #[must_use]
    pub fn count(&self, status: ModuleStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Outcome recorded for the module at `unit`, if it was discovered.
    #[must_use]
    pub fn status_of(&self, unit: &ModuleUnit) -> Option<ModuleStatus> {
        self.outcomes
            .iter()
            .find(|o| &o.unit == unit)
            .map(|o| o.status)
    }
}

/// Run one module over every section that has a customisation source.
///
/// Sections are visited in registry order.  A section whose logical name is
/// not indexed is skipped; a source that cannot be read is reported once and
/// skipped without invoking the module.  Returns `true` as soon as one
/// invocation reports success, so later sections are never attempted.
#[must_use]
pub fn dispatch(customiser: &dyn Customise, ctx: &DispatchContext<'_>) -> bool {
    for section in ctx.sections {
        let name = section.logical_name();
        let Some(path) = ctx.index.get(name) else {
            continue;
        };

        let content = match ctx.fs_ops.read(path) {
            Ok(content) => content,
            Err(e) => {
                ctx.log.warn(&format!(
                    "There was a problem reading {name}: {e}; continuing without it"
                ));
                continue;
            }
        };

        ctx.log
            .debug(&format!("customising {name} for [{}]", section.name()));
        if customiser.customise(&content, section, name) {
            return true;
        }
    }
    false
}

/// Discover, load and dispatch every module from `loader`.
///
/// A failure of one module never affects the others.  If discovery fails the
/// error is logged and no module runs.
#[must_use]
pub fn run_modules(loader: &dyn ModuleLoader, ctx: &DispatchContext<'_>) -> RunReport {
    let units = match loader.discover() {
        Ok(units) => units,
        Err(e) => {
            ctx.log.error(&e.to_string());
            return RunReport {
                outcomes: Vec::new(),
                discovery_failed: true,
            };
        }
    };

    if units.is_empty() {
        ctx.log.debug("no module candidates found");
    }

    let mut report = RunReport::default();
    for unit in units {
        ctx.log.info(&format!("Loading plugin {unit}"));
        let (status, detail) = run_module(loader, &unit, ctx);
        ctx.log
            .record_module(&unit.to_string(), status, detail.as_deref());
        report.outcomes.push(ModuleOutcome { unit, status });
    }
    report
}

fn run_module(
    loader: &dyn ModuleLoader,
    unit: &ModuleUnit,
    ctx: &DispatchContext<'_>,
) -> (ModuleStatus, Option<String>) {
    let module = match loader.load(unit) {
        Ok(module) => module,
        Err(e) => {
            ctx.log.error(&e.to_string());
            return (ModuleStatus::LoadFailed, e.source().map(ToString::to_string));
        }
    };

    let customiser = match module.resolve() {
        Ok(customiser) => customiser,
        Err(e) => {
            ctx.log.error(&e.to_string());
            return (ModuleStatus::Unresolved, e.source().map(ToString::to_string));
        }
    };

    if dispatch(customiser.as_ref(), ctx) {
        (ModuleStatus::Customised, None)
    } else {
        ctx.log.warn(&format!("No customisation by {unit}"));
        (ModuleStatus::NotCustomised, None)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::sections::{ConfigurationSection, FILE_NAME_KEY};
    use crate::error::ModuleError;
    use crate::logging::{Level, MemoryLog};
    use crate::modules::Module;
    use crate::operations::MockFileSystemOps;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    mockall::mock! {
        Customiser {}
        impl Customise for Customiser {
            fn customise(
                &self,
                content: &[u8],
                section: &ConfigurationSection,
                file_name: &str,
            ) -> bool;
        }
    }

    fn section(name: &str, file: &str) -> ConfigurationSection {
        ConfigurationSection::new(name, vec![(FILE_NAME_KEY.to_string(), file.to_string())])
            .unwrap()
    }

    fn registry(sections: &[(&str, &str)]) -> SectionRegistry {
        SectionRegistry::from_sections(sections.iter().map(|(n, f)| section(n, f)).collect())
    }

    fn index(paths: &[&str]) -> CustomisationIndex {
        CustomisationIndex::from_paths(paths.iter().map(PathBuf::from), &MemoryLog::new())
    }

    fn ctx<'a>(
        sections: &'a SectionRegistry,
        index: &'a CustomisationIndex,
        fs_ops: &'a MockFileSystemOps,
        log: &'a MemoryLog,
    ) -> DispatchContext<'a> {
        DispatchContext {
            sections,
            index,
            fs_ops,
            log,
        }
    }

    // ------------------------------------------------------------------
    // dispatch
    // ------------------------------------------------------------------

    #[test]
    fn index_miss_never_invokes() {
        let sections = registry(&[("db", "db.conf"), ("web", "web.conf")]);
        let index = index(&["/custom/other.conf"]);
        let fs = MockFileSystemOps::new().with_file("/custom/other.conf", b"x");
        let log = MemoryLog::new();

        let mut mock = MockCustomiser::new();
        mock.expect_customise().never();

        assert!(!dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
        assert!(fs.reads().is_empty());
    }

    #[test]
    fn zero_sections_is_not_customised() {
        let sections = SectionRegistry::default();
        let index = index(&["/custom/db.conf"]);
        let fs = MockFileSystemOps::new();
        let log = MemoryLog::new();

        let mut mock = MockCustomiser::new();
        mock.expect_customise().never();

        assert!(!dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
    }

    #[test]
    fn read_failure_skips_section_and_logs_once() {
        let sections = registry(&[("broken", "broken.conf"), ("db", "db.conf")]);
        let index = index(&["/custom/broken.conf", "/custom/db.conf"]);
        let fs = MockFileSystemOps::new()
            .with_unreadable_file("/custom/broken.conf")
            .with_file("/custom/db.conf", b"port = 5432");
        let log = MemoryLog::new();

        let mut mock = MockCustomiser::new();
        mock.expect_customise()
            .withf(|_, _, file_name| file_name.eq("db.conf"))
            .times(1)
            .return_const(false);

        assert!(!dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
        let warnings = log.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("There was a problem reading broken.conf:"));
    }

    #[test]
    fn module_receives_content_section_and_name() {
        let sections = registry(&[("db", "db.conf")]);
        let index = index(&["/custom/db.conf"]);
        let fs = MockFileSystemOps::new().with_file("/custom/db.conf", b"port = 5432");
        let log = MemoryLog::new();

        let mut mock = MockCustomiser::new();
        mock.expect_customise()
            .withf(|content, section, file_name| {
                content.eq(b"port = 5432".as_slice())
                    && section.name().eq("db")
                    && file_name.eq("db.conf")
            })
            .times(1)
            .return_const(true);

        assert!(dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
    }

    #[test]
    fn first_success_short_circuits() {
        let sections = registry(&[("a", "a.conf"), ("b", "b.conf"), ("c", "c.conf")]);
        let index = index(&["/custom/a.conf", "/custom/b.conf", "/custom/c.conf"]);
        let fs = MockFileSystemOps::new()
            .with_file("/custom/a.conf", b"a")
            .with_file("/custom/b.conf", b"b")
            .with_file("/custom/c.conf", b"c");
        let log = MemoryLog::new();

        let mut seq = mockall::Sequence::new();
        let mut mock = MockCustomiser::new();
        mock.expect_customise()
            .withf(|_, _, file_name| file_name.eq("a.conf"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        mock.expect_customise()
            .withf(|_, _, file_name| file_name.eq("b.conf"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);
        mock.expect_customise()
            .withf(|_, _, file_name| file_name.eq("c.conf"))
            .never();

        assert!(dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
        assert_eq!(
            fs.reads(),
            vec![PathBuf::from("/custom/a.conf"), PathBuf::from("/custom/b.conf")]
        );
    }

    #[test]
    fn duplicate_logical_names_are_each_tried() {
        let sections = registry(&[("first", "app.conf"), ("second", "app.conf")]);
        let index = index(&["/custom/app.conf"]);
        let fs = MockFileSystemOps::new().with_file("/custom/app.conf", b"app");
        let log = MemoryLog::new();

        let mut seq = mockall::Sequence::new();
        let mut mock = MockCustomiser::new();
        mock.expect_customise()
            .withf(|_, section, _| section.name().eq("first"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        mock.expect_customise()
            .withf(|_, section, _| section.name().eq("second"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);

        assert!(dispatch(&mock, &ctx(&sections, &index, &fs, &log)));
    }

    // ------------------------------------------------------------------
    // run_modules
    // ------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Behaviour {
        LoadFails,
        Unresolved,
        Answers(Vec<bool>),
    }

    type Calls = Arc<Mutex<Vec<(String, String)>>>;

    #[derive(Debug)]
    struct FakeLoader {
        units: Vec<(ModuleUnit, Behaviour)>,
        calls: Calls,
        discovery_fails: bool,
    }

    impl FakeLoader {
        fn new(units: &[(&str, Behaviour)]) -> Self {
            Self {
                units: units
                    .iter()
                    .map(|(p, b)| (ModuleUnit::new(*p), b.clone()))
                    .collect(),
                calls: Arc::default(),
                discovery_fails: false,
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ModuleLoader for FakeLoader {
        fn discover(&self) -> Result<Vec<ModuleUnit>, ModuleError> {
            if self.discovery_fails {
                return Err(ModuleError::Discovery {
                    dir: PathBuf::from("/opt/plugins"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            Ok(self.units.iter().map(|(u, _)| u.clone()).collect())
        }

        fn load(&self, unit: &ModuleUnit) -> Result<Box<dyn Module>, ModuleError> {
            let (_, behaviour) = self.units.iter().find(|(u, _)| u == unit).unwrap();
            if matches!(behaviour, Behaviour::LoadFails) {
                return Err(ModuleError::Load {
                    module: unit.to_string(),
                    source: "invalid ELF header".into(),
                });
            }
            Ok(Box::new(FakeModule {
                unit: unit.clone(),
                behaviour: behaviour.clone(),
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    #[derive(Debug)]
    struct FakeModule {
        unit: ModuleUnit,
        behaviour: Behaviour,
        calls: Calls,
    }

    impl Module for FakeModule {
        fn resolve(&self) -> Result<Box<dyn Customise + '_>, ModuleError> {
            match &self.behaviour {
                Behaviour::Answers(answers) => Ok(Box::new(FakeCustomiser {
                    module: self.unit.to_string(),
                    answers: Mutex::new(answers.clone()),
                    calls: &self.calls,
                })),
                _ => Err(ModuleError::Unresolved {
                    module: self.unit.to_string(),
                    symbol: "Customise".to_string(),
                    source: "undefined symbol: Customise".into(),
                }),
            }
        }
    }

    struct FakeCustomiser<'a> {
        module: String,
        answers: Mutex<Vec<bool>>,
        calls: &'a Calls,
    }

    impl Customise for FakeCustomiser<'_> {
        fn customise(&self, _: &[u8], section: &ConfigurationSection, _: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((self.module.clone(), section.name().to_string()));
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                false
            } else {
                answers.remove(0)
            }
        }
    }

    fn db_setup() -> (SectionRegistry, CustomisationIndex, MockFileSystemOps) {
        (
            registry(&[("db", "db.conf"), ("web", "web.conf")]),
            index(&["/custom/db.conf", "/custom/web.conf"]),
            MockFileSystemOps::new()
                .with_file("/custom/db.conf", b"db")
                .with_file("/custom/web.conf", b"web"),
        )
    }

    #[test]
    fn load_failure_is_logged_and_next_module_runs() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let loader = FakeLoader::new(&[
            ("/p/a.so", Behaviour::LoadFails),
            ("/p/b.so", Behaviour::Answers(vec![true])),
        ]);

        let report = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        assert_eq!(
            report.status_of(&ModuleUnit::new("/p/a.so")),
            Some(ModuleStatus::LoadFailed)
        );
        assert_eq!(
            report.status_of(&ModuleUnit::new("/p/b.so")),
            Some(ModuleStatus::Customised)
        );
        assert!(log.contains(Level::Error, "Could not load plugin /p/a.so"));
        assert_eq!(log.messages(Level::Info), ["Loading plugin /p/a.so", "Loading plugin /p/b.so"]);
    }

    #[test]
    fn unresolved_module_is_never_dispatched() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let loader = FakeLoader::new(&[("/p/a.so", Behaviour::Unresolved)]);

        let report = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        assert_eq!(report.count(ModuleStatus::Unresolved), 1);
        assert!(loader.calls().is_empty());
        assert!(fs.reads().is_empty());
        assert!(log.contains(Level::Error, "Could not lookup 'Customise' in /p/a.so"));
        assert_eq!(log.count(Level::Warn), 0);
    }

    #[test]
    fn module_that_customises_nothing_gets_a_warning() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let loader = FakeLoader::new(&[("/p/a.so", Behaviour::Answers(vec![false, false]))]);

        let report = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        assert_eq!(report.count(ModuleStatus::NotCustomised), 1);
        assert_eq!(log.messages(Level::Warn), ["No customisation by /p/a.so"]);
        assert_eq!(loader.calls().len(), 2);
    }

    #[test]
    fn short_circuit_of_one_module_does_not_affect_the_next() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let loader = FakeLoader::new(&[
            ("/p/a.so", Behaviour::Answers(vec![true])),
            ("/p/b.so", Behaviour::Answers(vec![false, true])),
        ]);

        let report = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        assert_eq!(report.count(ModuleStatus::Customised), 2);
        assert_eq!(
            loader.calls(),
            vec![
                ("/p/a.so".to_string(), "db".to_string()),
                ("/p/b.so".to_string(), "db".to_string()),
                ("/p/b.so".to_string(), "web".to_string()),
            ]
        );
    }

    #[test]
    fn discovery_failure_dispatches_nothing() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let mut loader = FakeLoader::new(&[("/p/a.so", Behaviour::Answers(vec![true]))]);
        loader.discovery_fails = true;

        let report = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        assert!(report.discovery_failed);
        assert!(report.outcomes.is_empty());
        assert!(loader.calls().is_empty());
        assert_eq!(log.count(Level::Error), 1);
    }

    #[test]
    fn outcomes_are_recorded_for_the_summary() {
        let (sections, index, fs) = db_setup();
        let log = MemoryLog::new();
        let loader = FakeLoader::new(&[
            ("/p/a.so", Behaviour::LoadFails),
            ("/p/b.so", Behaviour::Answers(vec![])),
        ]);

        let _ = run_modules(&loader, &ctx(&sections, &index, &fs, &log));

        let entries = log.module_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, ModuleStatus::LoadFailed);
        assert_eq!(entries[0].message.as_deref(), Some("invalid ELF header"));
        assert_eq!(entries[1].status, ModuleStatus::NotCustomised);
        assert_eq!(entries[1].message, None);
    }
}
