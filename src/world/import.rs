//! world::import
//!
//! Import rules: a pattern plus the realm that names matching it resolve in.
//!
//! # Ordering
//!
//! Rules are kept in a `BTreeSet` under a total order: most specific pattern
//! first (see [`ImportPattern`]'s `Ord`), then source realm id. Two rules are
//! equal only when both pattern and source are equal, so iteration order,
//! and with it every routing decision, is independent of insertion order.

use std::cmp::Ordering;
use std::sync::{Arc, Weak};

use thiserror::Error;

use super::realm::Realm;
use crate::core::pattern::ImportPattern;
use crate::core::types::RealmId;

/// Errors from declaring imports.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// A realm cannot import from itself.
    #[error("realm '{0}' cannot import from itself")]
    SelfImport(RealmId),

    /// The named source realm does not exist.
    #[error("no such realm: {0}")]
    NoSuchRealm(RealmId),

    /// The source realm belongs to a different graph.
    #[error("realm '{0}' belongs to a different realm graph")]
    ForeignRealm(RealmId),
}

/// A single import rule.
#[derive(Clone)]
pub struct ImportRule {
    pattern: ImportPattern,
    /// `None` for parent imports, where the parent is implicit.
    source: Option<(RealmId, Weak<Realm>)>,
}

impl ImportRule {
    pub(crate) fn foreign(pattern: ImportPattern, source: &Arc<Realm>) -> Self {
        Self {
            pattern,
            source: Some((source.id().clone(), Arc::downgrade(source))),
        }
    }

    pub(crate) fn parent(pattern: ImportPattern) -> Self {
        Self {
            pattern,
            source: None,
        }
    }

    pub fn pattern(&self) -> &ImportPattern {
        &self.pattern
    }

    /// Id of the source realm (`None` for parent imports).
    pub fn source_id(&self) -> Option<&RealmId> {
        self.source.as_ref().map(|(id, _)| id)
    }

    /// The source realm, while its graph is alive.
    pub fn source(&self) -> Option<Arc<Realm>> {
        self.source.as_ref().and_then(|(_, realm)| realm.upgrade())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }
}

impl Ord for ImportRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pattern
            .cmp(&other.pattern)
            .then_with(|| self.source_id().cmp(&other.source_id()))
    }
}

impl PartialOrd for ImportRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ImportRule {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ImportRule {}

impl std::fmt::Debug for ImportRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportRule")
            .field("pattern", &self.pattern)
            .field("source", &self.source_id())
            .finish()
    }
}

impl std::fmt::Display for ImportRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source_id() {
            Some(id) => write!(f, "{} from {}", self.pattern, id),
            None => write!(f, "{}", self.pattern),
        }
    }
}
