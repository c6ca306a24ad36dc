//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML files: the application
//! configuration, searched in several locations, and the node information
//! table given with `--info`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use clickgraph::{ClickGraphError, config::AppConfig, info_graph::NodeInfo};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for ClickGraphError {
    fn from(err: ConfigError) -> Self {
        ClickGraphError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (clickgraph/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or holds invalid values
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ClickGraphError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("clickgraph/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "clickgraph", "clickgraph") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ClickGraphError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .theme()
        .fallback_foreground()
        .map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Contents of an `--info` file.
///
/// ```toml
/// default = "<p>Select a declaration</p>"
///
/// [[nodes]]
/// id = "A"
/// html = "<h1>A</h1>"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct InfoFile {
    #[serde(default)]
    default: String,
    #[serde(default)]
    nodes: Vec<NodeInfo>,
}

impl InfoFile {
    pub fn default_content(&self) -> &str {
        &self.default
    }

    pub fn into_nodes(self) -> Vec<NodeInfo> {
        self.nodes
    }
}

/// Load a node information table.
///
/// # Errors
///
/// Returns error if the file is missing or is not a valid table.
pub fn load_info(path: impl AsRef<Path>) -> Result<InfoFile, ClickGraphError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    info!(path = path.display().to_string(); "Loading node information");
    let content = fs::read_to_string(path)?;
    let info: InfoFile = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    debug!(nodes = info.nodes.len(); "Node information loaded");
    Ok(info)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_explicit_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Missing configuration file"));
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[layout]\nfont_size = 20.0\n[theme]\nfallback_foreground = \"#cccccc\"\n")
            .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.layout().font_size(), 20.0);
        assert!(config.theme().fallback_foreground().unwrap().is_some());
    }

    #[test]
    fn test_invalid_fallback_colour_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[theme]\nfallback_foreground = \"not a colour\"\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ClickGraphError::Config(_)));
        assert!(err.to_string().contains("Validation error"));
    }

    #[test]
    fn test_load_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info.toml");
        fs::write(
            &path,
            "default = \"<p>none</p>\"\n\n[[nodes]]\nid = \"A\"\nhtml = \"<h1>A</h1>\"\n",
        )
        .unwrap();
        let info = load_info(&path).unwrap();
        assert_eq!(info.default_content(), "<p>none</p>");
        let nodes = info.into_nodes();
        assert_eq!(nodes, vec![NodeInfo::new("A", "<h1>A</h1>")]);
    }
}
