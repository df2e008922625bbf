//! Run settings and the system configuration store.
pub mod ini;
pub mod sections;

use std::path::PathBuf;

use crate::cli::GlobalOpts;

/// Environment variable selecting the module directory.
pub const PLUGIN_DIR_ENV: &str = "CONF_PLUGIN_FOLDER";
/// Environment variable selecting the system configuration store.
pub const ETC_DIR_ENV: &str = "CONF_ETC_FOLDER";
/// Environment variable selecting the customisation directory.
pub const CUSTOMISATION_DIR_ENV: &str = "CONF_CUSTOMISATION_FOLDER";

/// Default module directory.
pub const DEFAULT_PLUGIN_DIR: &str = "/opt/configurability/plugins";
/// Default system configuration store.
pub const DEFAULT_ETC_DIR: &str = "/etc/configurability";
/// Default customisation directory.
pub const DEFAULT_CUSTOMISATION_DIR: &str = "/etc/configurability/custom";

/// Directories used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory scanned for loadable modules.
    pub plugin_dir: PathBuf,
    /// Directory of INI files declaring configuration sections.
    pub etc_dir: PathBuf,
    /// Directory of customisation source files.
    pub customisation_dir: PathBuf,
}

impl Settings {
    /// Resolve settings from CLI options and the process environment.
    #[must_use]
    pub fn from_env(global: &GlobalOpts) -> Self {
        Self::resolve(global, |name| std::env::var(name).ok())
    }

    /// Resolve settings with precedence CLI flag > environment > default.
    ///
    /// An unset or empty environment variable falls back to the default.
    ///
    /// ```
    /// use configurability::cli::GlobalOpts;
    /// use configurability::config::Settings;
    /// use std::path::PathBuf;
    ///
    /// let global = GlobalOpts::default();
    /// let settings = Settings::resolve(&global, |name| {
    ///     (name == "CONF_PLUGIN_FOLDER").then(|| "/srv/plugins".to_string())
    /// });
    /// assert_eq!(settings.plugin_dir, PathBuf::from("/srv/plugins"));
    /// assert_eq!(settings.etc_dir, PathBuf::from("/etc/configurability"));
    /// ```
    #[must_use]
    pub fn resolve(global: &GlobalOpts, env: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |flag: Option<&PathBuf>, var: &str, default: &str| {
            flag.cloned().unwrap_or_else(|| {
                env(var)
                    .filter(|v| !v.is_empty())
                    .map_or_else(|| PathBuf::from(default), PathBuf::from)
            })
        };
        Self {
            plugin_dir: pick(global.plugin_dir.as_ref(), PLUGIN_DIR_ENV, DEFAULT_PLUGIN_DIR),
            etc_dir: pick(global.etc_dir.as_ref(), ETC_DIR_ENV, DEFAULT_ETC_DIR),
            customisation_dir: pick(
                global.customisation_dir.as_ref(),
                CUSTOMISATION_DIR_ENV,
                DEFAULT_CUSTOMISATION_DIR,
            ),
        }
    }
}
