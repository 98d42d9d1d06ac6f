//! core::config::world
//!
//! Loading, validating and instantiating world configs.
//!
//! # Validation
//!
//! A [`WorldFile`] is checked as a whole before any realm is created:
//!
//! - realm ids are valid and unique
//! - every `parent` and import `from` names a listed realm
//! - parent links are acyclic
//! - no realm imports from itself
//! - policy names and search path references parse
//!
//! Building then creates realms parents-first, so a config that validates
//! always builds into an empty graph.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema::{parse_policy, ImportConfig, RealmConfig, WorldConfig};
use super::ConfigError;
use crate::core::graph::ParentGraph;
use crate::core::pattern::ImportPattern;
use crate::core::types::{Location, RealmId};
use crate::world::{OrderingPolicy, Realm, RealmGraph};

/// A world config together with the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub struct WorldFile {
    pub config: WorldConfig,
    base_dir: PathBuf,
}

impl WorldFile {
    /// Read and parse a world config.
    ///
    /// # Errors
    ///
    /// `ReadError` / `ParseError` for unreadable or malformed files. The
    /// file is not validated here; see [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: WorldConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(path = %path.display(), realms = config.realms.len(), "world config loaded");
        Ok(Self { config, base_dir })
    }

    /// Wrap an in-memory config; relative paths resolve against `base_dir`.
    pub fn new(config: WorldConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check the whole config. Returns the parent topology on success.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` naming the first problem found.
    pub fn validate(&self) -> Result<ParentGraph, ConfigError> {
        let mut ids = BTreeSet::new();
        for realm in &self.config.realms {
            let id = parse_id(&realm.id)?;
            if !ids.insert(id) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate realm id '{}'",
                    realm.id
                )));
            }
        }

        let mut topology = ParentGraph::new();
        for realm in &self.config.realms {
            let id = parse_id(&realm.id)?;
            match &realm.parent {
                Some(parent) => {
                    let parent = self.known(&ids, parent, || format!("parent of '{}'", realm.id))?;
                    topology.add_edge(id, parent);
                }
                None => topology.add_root(id),
            }
        }
        if let Some(realm) = topology.find_cycle() {
            return Err(ConfigError::InvalidValue(format!(
                "parent links of realm '{realm}' form a cycle"
            )));
        }

        for realm in &self.config.realms {
            self.validate_realm(realm, &ids)?;
        }
        Ok(topology)
    }

    fn validate_realm(&self, realm: &RealmConfig, ids: &BTreeSet<RealmId>) -> Result<(), ConfigError> {
        if let Some(policy) = &realm.policy {
            parse_policy(policy)?;
        }
        for entry in &realm.search_path {
            self.location(entry)?;
        }
        for import in &realm.imports {
            self.known(ids, &import.from, || format!("import source of '{}'", realm.id))?;
            if import.from == realm.id {
                return Err(ConfigError::InvalidValue(format!(
                    "realm '{}' cannot import from itself",
                    realm.id
                )));
            }
        }
        Ok(())
    }

    fn known(
        &self,
        ids: &BTreeSet<RealmId>,
        raw: &str,
        role: impl FnOnce() -> String,
    ) -> Result<RealmId, ConfigError> {
        let id = parse_id(raw)?;
        if ids.contains(&id) {
            Ok(id)
        } else {
            Err(ConfigError::InvalidValue(format!(
                "{}: no such realm '{raw}'",
                role()
            )))
        }
    }

    /// Parse a search path reference, anchoring relative file paths.
    fn location(&self, reference: &str) -> Result<Location, ConfigError> {
        let location = Location::parse(reference)
            .map_err(|e| ConfigError::InvalidValue(format!("search path entry '{reference}': {e}")))?;
        Ok(match location {
            Location::File(path) if path.is_relative() => Location::File(self.base_dir.join(path)),
            other => other,
        })
    }

    /// Validate, then create every realm in a fresh graph.
    pub fn build(&self) -> Result<RealmGraph, ConfigError> {
        self.build_with(RealmGraph::new())
    }

    /// Validate, then create every realm in `graph`.
    ///
    /// # Errors
    ///
    /// Validation errors, or `ConfigError::Graph` if `graph` already holds
    /// one of the ids.
    pub fn build_with(&self, graph: RealmGraph) -> Result<RealmGraph, ConfigError> {
        let topology = self.validate()?;

        for id in topology.topological_order() {
            let Some(config) = self.config.realms.iter().find(|r| r.id == id.as_str()) else {
                continue;
            };
            let policy: Option<Arc<dyn OrderingPolicy>> = match &config.policy {
                Some(name) => Some(parse_policy(name)?.shared()),
                None => None,
            };
            let realm = match topology.parent(&id) {
                Some(parent) => {
                    let parent = graph.realm(parent)?;
                    graph.new_child_realm(id.clone(), &parent, policy)?
                }
                None => match policy {
                    Some(policy) => graph.new_realm_with_policy(id.clone(), policy)?,
                    None => graph.new_realm(id.clone())?,
                },
            };
            self.configure(&realm, config)?;
        }

        // imports once every source exists
        for config in &self.config.realms {
            let realm = graph.realm(&parse_id(&config.id)?)?;
            for import in &config.imports {
                realm.declare_import_from(&parse_id(&import.from)?, import_pattern(import))?;
            }
        }

        tracing::info!(realms = graph.len(), "world built");
        Ok(graph)
    }

    fn configure(&self, realm: &Realm, config: &RealmConfig) -> Result<(), ConfigError> {
        for entry in &config.search_path {
            realm.add_location(self.location(entry)?);
        }
        if let Some(patterns) = &config.parent_imports {
            realm.close_parent_gate();
            for pattern in patterns {
                realm.declare_parent_import(ImportPattern::parse(pattern));
            }
        }
        if config.shims {
            realm.enable_shims();
        }
        Ok(())
    }
}

fn parse_id(raw: &str) -> Result<RealmId, ConfigError> {
    RealmId::new(raw).map_err(|e| ConfigError::InvalidValue(format!("realm id '{raw}': {e}")))
}

/// `exact = true` forces an exact match; otherwise the pattern uses the same
/// syntax as `parent_imports` (`=name` exact, anything else a prefix).
fn import_pattern(import: &ImportConfig) -> ImportPattern {
    let text = import.pattern.trim();
    if import.exact {
        ImportPattern::exact(text.strip_prefix('=').unwrap_or(text))
    } else {
        ImportPattern::parse(text)
    }
}
