//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Realmwork has two kinds of configuration:
//! - **Global**: user-level defaults (ordering policy, log filter)
//! - **World**: the realms to build, their search paths and imports
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Per-realm settings in the world file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REALMWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/realmwork/config.toml`
//! 3. `~/.realmwork/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use realmwork::core::config::{Config, WorldFile};
//! use std::path::Path;
//!
//! let config = Config::load().unwrap();
//! let graph = realmwork::world::RealmGraph::builder()
//!     .default_policy(config.default_policy().shared())
//!     .build();
//!
//! let world = WorldFile::load(Path::new("realms.toml")).unwrap();
//! let graph = world.build_with(graph).unwrap();
//! println!("{}", graph.describe());
//! ```

pub mod schema;
pub mod world;

pub use schema::{GlobalConfig, ImportConfig, RealmConfig, WorldConfig};
pub use world::WorldFile;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::world::{BuiltinPolicy, GraphError, ImportError};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Loaded global configuration.
///
/// Accessor methods apply defaults for unset values.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load global configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global()?;
        global.validate()?;

        if let Some(path) = &global_path {
            tracing::debug!(path = %path.display(), "global config loaded");
        }
        Ok(Config {
            global,
            global_path,
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        for path in Self::candidate_paths() {
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((GlobalConfig::default(), None))
    }

    /// Global config locations in search order.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("REALMWORK_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("realmwork/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".realmwork/config.toml"));
        }
        paths
    }

    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Policy for realms that do not name one.
    ///
    /// Defaults to self-first. Invalid names were rejected by `load`.
    pub fn default_policy(&self) -> BuiltinPolicy {
        self.global
            .default_policy
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> Option<&str> {
        self.global.log_filter.as_deref()
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.default_policy(), BuiltinPolicy::SelfFirst);
        assert!(config.log_filter().is_none());
        assert!(config.global_config_loaded_from().is_none());
    }

    // Both env-driven cases share one test so they never race on the
    // process environment.
    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
            default_policy = "parent-first"
            log_filter = "realmwork=trace"
            "#,
        )
        .unwrap();

        std::env::set_var("REALMWORK_CONFIG", &config_path);
        let config = Config::load().unwrap();
        assert_eq!(config.default_policy(), BuiltinPolicy::ParentFirst);
        assert_eq!(config.log_filter(), Some("realmwork=trace"));
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));

        fs::write(&config_path, "default_policy = \"sideways\"").unwrap();
        assert!(matches!(Config::load(), Err(ConfigError::InvalidValue(_))));

        fs::write(&config_path, "unknown_field = true").unwrap();
        assert!(matches!(Config::load(), Err(ConfigError::ParseError { .. })));

        std::env::remove_var("REALMWORK_CONFIG");
    }
}
