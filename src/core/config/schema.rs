//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$REALMWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/realmwork/config.toml`
//! 3. `~/.realmwork/config.toml`
//!
//! # World Config
//!
//! A TOML file listing realms, passed explicitly (the CLI defaults to
//! `realms.toml` in the working directory).
//!
//! # Validation
//!
//! Config values are validated after parsing: policy names must be known,
//! ids and locations must parse. Cross-realm checks for world configs
//! live in [`super::world`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::world::BuiltinPolicy;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_policy = "parent-first"
/// log_filter = "realmwork=debug"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Policy for realms that do not name one.
    pub default_policy: Option<String>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(policy) = &self.default_policy {
            parse_policy(policy)?;
        }
        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "log_filter cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A set of realms.
///
/// # Example
///
/// ```toml
/// [[realm]]
/// id = "core"
/// search_path = ["lib/core", "jar:lib/api.jar!/"]
///
/// [[realm]]
/// id = "plugin"
/// parent = "core"
/// policy = "imports-first"
/// search_path = ["plugins/one"]
/// parent_imports = ["api.*"]
/// shims = true
///
/// [[realm.import]]
/// from = "core"
/// pattern = "svc.Widget"
/// exact = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    #[serde(rename = "realm")]
    pub realms: Vec<RealmConfig>,
}

/// One realm in a [`WorldConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RealmConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Ordering policy; the graph default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Location references, relative paths resolved against the world
    /// file's directory.
    #[serde(default)]
    pub search_path: Vec<String>,

    /// Absent: everything falls through to the parent. Present but empty:
    /// nothing does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_imports: Option<Vec<String>>,

    /// Enable shim materialization in this realm.
    #[serde(default)]
    pub shims: bool,

    #[serde(default, rename = "import")]
    pub imports: Vec<ImportConfig>,
}

/// A foreign import in a [`RealmConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Source realm id.
    pub from: String,

    /// Package prefix (`svc`, `svc.*`) or, with `exact`, a full name.
    pub pattern: String,

    #[serde(default)]
    pub exact: bool,
}

pub(crate) fn parse_policy(name: &str) -> Result<BuiltinPolicy, ConfigError> {
    BuiltinPolicy::from_str(name).map_err(|e| ConfigError::InvalidValue(e.to_string()))
}
