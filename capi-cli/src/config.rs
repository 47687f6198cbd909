//! capi configuration loading from `.capirc.toml`.
//!
//! Configuration is optional. Without a config file every command uses the
//! built-in defaults, and command-line flags always win over file settings.
//!
//! # Example Configuration
//!
//! ```toml
//! [diff]
//! ignore = ["third_party", "generated"]
//! threads = 4
//!
//! [check]
//! rules = ["API_CHANGE_INCOMPATIBLE_01", "API_CHANGE_INCOMPATIBLE_06"]
//! fail_on_findings = true
//!
//! [output]
//! format = "table"
//! color = true
//! dir = "capi-reports"
//!
//! [[kits]]
//! path = "multimedia/audio"
//! kit = "AudioKit"
//! subsystem = "multimedia"
//! ```

use std::path::{Path, PathBuf};

use capi_core::{DiffOptions, KitMapping};
use serde::Deserialize;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".capirc.toml";

/// Errors reading a config file. Callers log these and fall back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Root configuration structure loaded from `.capirc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct CapiConfig {
    #[serde(default)]
    pub diff: DiffSection,

    #[serde(default)]
    pub check: CheckSection,

    #[serde(default)]
    pub output: OutputSettings,

    /// Kit and subsystem assignment by header path prefix.
    #[serde(default)]
    pub kits: Vec<KitMapping>,
}

/// Traversal settings for `capi diff` and `capi check`.
#[derive(Debug, Deserialize, Default)]
pub struct DiffSection {
    /// Directory names skipped in addition to the built-in list.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Worker threads for parsing and diffing. Defaults to one per core.
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Rule selection for `capi check`.
#[derive(Debug, Deserialize, Default)]
pub struct CheckSection {
    /// Enabled rule ids. Empty enables every rule.
    #[serde(default)]
    pub rules: Vec<String>,

    /// Exit non-zero when any finding is reported.
    #[serde(default)]
    pub fail_on_findings: bool,
}

/// Output formatting preferences.
///
/// Distinct from the runtime `OutputConfig` in the output module, which
/// handles actual rendering.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`, `csv`, `markdown`
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub color: Option<bool>,

    /// Directory for `capi diff` report files when `--output-dir` is absent.
    #[serde(default)]
    pub dir: Option<String>,
}

impl CapiConfig {
    /// Load `.capirc.toml` from the given directory, or defaults when absent.
    pub fn load(root: &Path) -> Self {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        Self::load_file(&path)
    }

    /// Load an explicit config file. Problems are logged and defaults returned.
    pub fn load_file(path: &Path) -> Self {
        match Self::try_load_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Self::default()
            }
        }
    }

    pub fn try_load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Engine options: built-in ignores plus configured ones, kits, threads.
    ///
    /// `threads` from the command line overrides the file setting.
    pub fn diff_options(&self, threads: Option<usize>) -> DiffOptions {
        let mut options = DiffOptions::default();
        for dir in &self.diff.ignore {
            let dir = dir.trim_end_matches('/').to_string();
            if !options.ignored_dirs.contains(&dir) {
                options.ignored_dirs.push(dir);
            }
        }
        options.threads = threads.or(self.diff.threads);
        options.kits = self.kits.clone();
        options
    }

    /// Rule ids to enable: command-line ids win, then the file list.
    ///
    /// `None` enables every rule.
    pub fn enabled_rules(&self, cli_rules: &[String]) -> Option<Vec<String>> {
        if !cli_rules.is_empty() {
            Some(cli_rules.to_vec())
        } else if !self.check.rules.is_empty() {
            Some(self.check.rules.clone())
        } else {
            None
        }
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.output.dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CapiConfig::default();
        assert!(config.diff.ignore.is_empty());
        assert!(config.kits.is_empty());
        assert!(!config.check.fail_on_findings);
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[diff]
ignore = ["third_party/", "generated"]
threads = 4

[check]
rules = ["API_CHANGE_INCOMPATIBLE_06"]
fail_on_findings = true

[output]
format = "json"
color = false
dir = "reports"

[[kits]]
path = "multimedia/audio"
kit = "AudioKit"
subsystem = "multimedia"

[[kits]]
path = "net"
kit = "NetKit"
"#;
        let config: CapiConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.diff.threads, Some(4));
        assert!(config.check.fail_on_findings);
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
        assert_eq!(config.output_dir(), Some("reports"));

        assert_eq!(config.kits.len(), 2);
        assert_eq!(config.kits[0].subsystem, "multimedia");
        assert_eq!(config.kits[1].subsystem, "");
    }

    #[test]
    fn test_diff_options_merge_ignores() {
        let config: CapiConfig = toml::from_str("[diff]\nignore = [\"third_party/\", \"tee\"]\nthreads = 2\n").unwrap();
        let options = config.diff_options(None);

        assert!(options.ignored_dirs.contains(&"third_party".to_string()));
        assert!(options.ignored_dirs.contains(&"linux".to_string()));
        assert_eq!(options.ignored_dirs.iter().filter(|d| *d == "tee").count(), 1);
        assert_eq!(options.threads, Some(2));

        assert_eq!(config.diff_options(Some(8)).threads, Some(8));
    }

    #[test]
    fn test_enabled_rules_precedence() {
        let config: CapiConfig =
            toml::from_str("[check]\nrules = [\"API_CHANGE_INCOMPATIBLE_01\"]\n").unwrap();

        assert_eq!(
            config.enabled_rules(&[]),
            Some(vec!["API_CHANGE_INCOMPATIBLE_01".to_string()])
        );
        let cli = vec!["API_CHANGE_INCOMPATIBLE_06".to_string()];
        assert_eq!(config.enabled_rules(&cli), Some(cli.clone()));
        assert_eq!(CapiConfig::default().enabled_rules(&[]), None);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[diff\nignore = 3").unwrap();

        assert!(matches!(
            CapiConfig::try_load_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        let config = CapiConfig::load(dir.path());
        assert!(config.diff.ignore.is_empty());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = CapiConfig::load(dir.path());
        assert!(config.kits.is_empty());
        assert!(matches!(
            CapiConfig::try_load_file(&dir.path().join("nope.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
