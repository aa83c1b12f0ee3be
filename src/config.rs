//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treestore/treestore.toml`
//! 3. Local config: `<dir>/.treestore.toml` (working directory or `-C`)
//! 4. Environment variables: `TREESTORE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DocumentFormat;
use crate::application::ApplicationError;

/// Settings for the `tree` rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeSettings {
    /// Label printed above the roots
    pub root_label: String,
    /// Levels shown below the roots, unlimited if unset
    pub max_depth: Option<usize>,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            root_label: ".".into(),
            max_depth: None,
        }
    }
}

/// Raw tree settings for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTreeSettings {
    pub root_label: Option<String>,
    pub max_depth: Option<usize>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub format: Option<DocumentFormat>,
    pub pretty: Option<bool>,
    #[serde(default)]
    pub tree: RawTreeSettings,
}

/// Unified configuration for treestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Document format when the extension does not tell, and for output
    pub format: DocumentFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Tree rendering settings
    pub tree: TreeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: DocumentFormat::Json,
            pretty: true,
            tree: TreeSettings::default(),
        }
    }
}

/// Get the XDG config directory for treestore.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treestore").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treestore.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".treestore.toml")
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

impl Settings {
    /// Merge overlay config onto self: overlay wins where it says something.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            format: overlay.format.unwrap_or(self.format),
            pretty: overlay.pretty.unwrap_or(self.pretty),
            tree: TreeSettings {
                root_label: overlay
                    .tree
                    .root_label
                    .clone()
                    .unwrap_or_else(|| self.tree.root_label.clone()),
                max_depth: overlay.tree.max_depth.or(self.tree.max_depth),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.treestore.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/treestore/treestore.toml`
    /// 3. Local config: `<local_dir>/.treestore.toml`
    /// 4. Environment variables: `TREESTORE_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply TREESTORE_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`: `TREESTORE_TREE__ROOT_LABEL`.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREESTORE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("format") {
            settings.format = match val.to_lowercase().as_str() {
                "json" => DocumentFormat::Json,
                "toml" => DocumentFormat::Toml,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("TREESTORE_FORMAT: unknown format {other}"),
                    })
                }
            };
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }
        if let Ok(val) = config.get_string("tree.root_label") {
            settings.tree.root_label = val;
        }
        if let Ok(val) = config.get_int("tree.max_depth") {
            settings.tree.max_depth = Some(max_depth_from_env(val)?);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treestore configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/treestore/treestore.toml
#   Local:  ./.treestore.toml
#   Env:    TREESTORE_* environment variables (TREESTORE_TREE__ROOT_LABEL for nested keys)

# Document format when the file extension does not tell, and for printed documents
# format = "json"

# Pretty-print JSON output
# pretty = true

[tree]
# Label printed above the roots
# root_label = "."

# Levels shown below the roots
# max_depth = 3
"#
        .to_string()
    }
}

fn max_depth_from_env(val: i64) -> Result<usize, ApplicationError> {
    usize::try_from(val).map_err(|_| ApplicationError::Config {
        message: format!("TREESTORE_TREE__MAX_DEPTH: expected a non-negative number, got {val}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
