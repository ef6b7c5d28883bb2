//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgtidy/orgtidy.toml`
//! 3. Local config: `<dir>/.orgtidy.toml` (working directory unless given)
//! 4. Environment variables: `ORGTIDY_*` prefix, `__` between section and key

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{PipelineOptions, SortOrder};

/// Display settings for the tree view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Sibling order in the tree view
    pub sort: SortOrder,
    /// Label of the synthetic root node
    pub root_label: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            sort: SortOrder::Insertion,
            root_label: "Organization".into(),
        }
    }
}

/// Unified configuration for orgtidy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Default org chart JSON file when none is given on the command line
    pub input: Option<PathBuf>,
    /// Transform tunables
    pub pipeline: PipelineOptions,
    /// Tree view settings
    pub display: DisplayConfig,
}

/// Raw pipeline section (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPipelineConfig {
    pub min_group_size: Option<usize>,
    pub min_prefix_len: Option<usize>,
    pub min_length_ratio: Option<f64>,
}

/// Raw display section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub sort: Option<SortOrder>,
    pub root_label: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub input: Option<PathBuf>,
    pub pipeline: RawPipelineConfig,
    pub display: RawDisplayConfig,
}

/// Get the XDG config directory for orgtidy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgtidy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgtidy.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".orgtidy.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
///
/// Unresolvable variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Value of `key` in `config`; None if unset, an error if it does not parse as `T`.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

impl Settings {
    /// Merge overlay config onto self (base): every specified value wins.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let pipeline = &overlay.pipeline;
        let display = &overlay.display;
        Self {
            input: overlay.input.clone().or_else(|| self.input.clone()),
            pipeline: PipelineOptions {
                min_group_size: pipeline
                    .min_group_size
                    .unwrap_or(self.pipeline.min_group_size),
                min_prefix_len: pipeline
                    .min_prefix_len
                    .unwrap_or(self.pipeline.min_prefix_len),
                min_length_ratio: pipeline
                    .min_length_ratio
                    .unwrap_or(self.pipeline.min_length_ratio),
            },
            display: DisplayConfig {
                sort: display.sort.unwrap_or(self.display.sort),
                root_label: display
                    .root_label
                    .clone()
                    .unwrap_or_else(|| self.display.root_label.clone()),
            },
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(input) = &self.input {
            let expanded = expand_env_vars(input.to_string_lossy().as_ref());
            self.input = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.orgtidy.toml` (skipped if None)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply ORGTIDY_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORGTIDY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "input")? {
            settings.input = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value(&config, "pipeline.min_group_size")? {
            settings.pipeline.min_group_size = val;
        }
        if let Some(val) = env_value(&config, "pipeline.min_prefix_len")? {
            settings.pipeline.min_prefix_len = val;
        }
        if let Some(val) = env_value(&config, "pipeline.min_length_ratio")? {
            settings.pipeline.min_length_ratio = val;
        }
        if let Some(val) = env_value::<String>(&config, "display.sort")? {
            settings.display.sort = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Some(val) = env_value(&config, "display.root_label")? {
            settings.display.root_label = val;
        }

        Ok(settings)
    }

    /// Reject tunables the transform cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let pipeline = &self.pipeline;
        if pipeline.min_group_size < 2 {
            return Err(ApplicationError::Config {
                message: format!(
                    "pipeline.min_group_size must be at least 2, got {}",
                    pipeline.min_group_size
                ),
            });
        }
        if pipeline.min_prefix_len < 1 {
            return Err(ApplicationError::Config {
                message: "pipeline.min_prefix_len must be at least 1".into(),
            });
        }
        if !(pipeline.min_length_ratio > 0.0 && pipeline.min_length_ratio <= 1.0) {
            return Err(ApplicationError::Config {
                message: format!(
                    "pipeline.min_length_ratio must be in (0, 1], got {}",
                    pipeline.min_length_ratio
                ),
            });
        }
        Ok(())
    }

    /// Serialize as TOML for `config show` and `config init`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

/// Commented template written by `config init`.
pub fn config_template() -> String {
    let defaults = Settings::default();
    format!(
        r#"# orgtidy configuration

# Default org chart when no INPUT is given
# input = "~/data/orgchart.json"

[pipeline]
# Siblings needed to form a prefix group
min_group_size = {}
# Shared prefix length for a sibling to join a group
min_prefix_len = {}
# shorter/longer length ratio for "one label contains the other" merges
min_length_ratio = {}

[display]
# insertion | name | size
sort = "insertion"
root_label = "{}"
"#,
        defaults.pipeline.min_group_size,
        defaults.pipeline.min_prefix_len,
        defaults.pipeline.min_length_ratio,
        defaults.display.root_label,
    )
}
