use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::component::{Component, NO_VERSION};
use crate::error::{ComponentError, Result};

/// Name of the configuration file looked up in the working and user config directories
pub const CONFIG_FILE_NAME: &str = "component-ident.toml";

/// Represents the complete configuration for component-ident.
///
/// Maps component names to their source location and packaging flags.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Root under which devel counters are persisted when a component has no explicit path
    #[serde(default)]
    pub artifacts_dir: Option<PathBuf>,

    #[serde(default)]
    pub components: HashMap<String, ComponentConfig>,
}

fn default_has_packages() -> bool {
    true
}

/// Per-component settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ComponentConfig {
    /// Source tree location; defaults to a directory named after the component
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    #[serde(default)]
    pub is_plugin: bool,

    #[serde(default = "default_has_packages")]
    pub has_packages: bool,

    /// Devel counter file; overrides the location derived from `artifacts_dir`
    #[serde(default)]
    pub devel_path: Option<PathBuf>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        ComponentConfig {
            source_dir: None,
            is_plugin: false,
            has_packages: default_has_packages(),
            devel_path: None,
        }
    }
}

impl Config {
    /// Devel counter location for `name`
    ///
    /// The explicit `devel_path` wins; otherwise the counter lives at
    /// `<artifacts_dir>/components/<name>/noversion/devel`.
    pub fn devel_path(&self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self
            .components
            .get(name)
            .and_then(|c| c.devel_path.clone())
        {
            return Some(path);
        }
        self.artifacts_dir.as_ref().map(|dir| {
            dir.join("components")
                .join(name)
                .join(NO_VERSION)
                .join("devel")
        })
    }

    /// Build the configured component `name`.
    ///
    /// # Returns
    /// * `Ok(Component)` - Component with flags and devel path applied
    /// * `Err` - If `name` is not configured
    pub fn component(&self, name: &str) -> Result<Component> {
        let settings = self.components.get(name).ok_or_else(|| {
            ComponentError::config(format!("Component '{}' is not configured", name))
        })?;

        let source_dir = settings
            .source_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(name));
        let mut component = Component::new(source_dir)
            .with_name(name)
            .with_plugin(settings.is_plugin)
            .with_packages(settings.has_packages);
        if let Some(path) = self.devel_path(name) {
            component = component.with_devel_path(path);
        }
        Ok(component)
    }

    /// Build an ad-hoc component for `source_dir`, using `artifacts_dir` for its devel counter
    pub fn component_for_dir(&self, source_dir: &Path) -> Component {
        let component = Component::new(source_dir);
        let devel_path = self.devel_path(component.name());
        match devel_path {
            Some(path) => component.with_devel_path(path),
            None => component,
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `component-ident.toml` in current directory
/// 3. `component-ident.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| ComponentError::io(&path, e))?;
    toml::from_str(&config_str).map_err(|e| {
        ComponentError::config(format!("Cannot parse {}: {}", path.display(), e))
    })
}
