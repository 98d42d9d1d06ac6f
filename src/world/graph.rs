//! world::graph
//!
//! The realm graph: owner of every realm, the shared artifact source and
//! the shim cache.
//!
//! Realms hold a weak back-reference to the graph so they can resolve
//! import sources by id and create children. Dropping the last
//! `RealmGraph` handle detaches its realms; lookups through imports whose
//! source realm is gone become misses.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::policy::{BuiltinPolicy, OrderingPolicy};
use super::realm::Realm;
use super::source::{ArtifactSource, FsSource, MemorySource, SourceChain};
use crate::core::graph::ParentGraph;
use crate::core::types::RealmId;
use crate::forge::ShimCache;

/// Errors from graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("realm '{0}' already exists")]
    DuplicateId(RealmId),

    #[error("no such realm: {0}")]
    NoSuchRealm(RealmId),

    #[error("parent realm '{0}' belongs to a different realm graph")]
    ForeignRealm(RealmId),

    #[error("realm graph has been dropped")]
    Detached,
}

pub(crate) struct GraphShared {
    realms: RwLock<BTreeMap<RealmId, Arc<Realm>>>,
    source: Arc<dyn ArtifactSource>,
    memory: MemorySource,
    shims: Arc<ShimCache>,
    default_policy: Arc<dyn OrderingPolicy>,
}

/// Handle to a realm graph. Clones share the same graph.
///
/// # Example
///
/// ```
/// use realmwork::core::types::{RealmId, SymbolName};
/// use realmwork::world::RealmGraph;
///
/// let graph = RealmGraph::new();
/// graph.memory().insert_artifact("core", "svc.Widget", b"widget".to_vec());
///
/// let core = graph.new_realm(RealmId::new("core").unwrap()).unwrap();
/// core.add_search_path_entry("mem:core").unwrap();
///
/// let plugin = core.create_child(RealmId::new("plugin").unwrap()).unwrap();
/// let widget = plugin.resolve(&SymbolName::new("svc.Widget").unwrap()).unwrap();
/// assert_eq!(widget.realm(), core.id());
///
/// let ids: Vec<_> = graph.children(core.id()).iter().map(|id| id.to_string()).collect();
/// assert_eq!(ids, ["plugin"]);
/// ```
#[derive(Clone)]
pub struct RealmGraph {
    shared: Arc<GraphShared>,
}

impl Default for RealmGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RealmGraph {
    /// A graph reading the filesystem and its own memory bundles, with the
    /// process-wide shim cache and the self-first policy.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RealmGraphBuilder {
        RealmGraphBuilder::default()
    }

    pub(crate) fn from_shared(shared: Arc<GraphShared>) -> Self {
        Self { shared }
    }

    /// Create a root realm with the default policy.
    pub fn new_realm(&self, id: RealmId) -> Result<Arc<Realm>, GraphError> {
        self.insert(id, None, None)
    }

    /// Create a root realm with an explicit policy.
    pub fn new_realm_with_policy(
        &self,
        id: RealmId,
        policy: Arc<dyn OrderingPolicy>,
    ) -> Result<Arc<Realm>, GraphError> {
        self.insert(id, None, Some(policy))
    }

    /// Create a realm whose parent is `parent`. `None` uses the default policy.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateId`] if `id` is taken
    /// - [`GraphError::ForeignRealm`] if `parent` belongs to another graph
    pub fn new_child_realm(
        &self,
        id: RealmId,
        parent: &Arc<Realm>,
        policy: Option<Arc<dyn OrderingPolicy>>,
    ) -> Result<Arc<Realm>, GraphError> {
        if !parent.belongs_to(&self.shared) {
            return Err(GraphError::ForeignRealm(parent.id().clone()));
        }
        self.insert(id, Some(parent), policy)
    }

    fn insert(
        &self,
        id: RealmId,
        parent: Option<&Arc<Realm>>,
        policy: Option<Arc<dyn OrderingPolicy>>,
    ) -> Result<Arc<Realm>, GraphError> {
        let mut realms = self.shared.realms.write();
        if realms.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }

        let policy = policy.unwrap_or_else(|| Arc::clone(&self.shared.default_policy));
        let realm = Arc::new(Realm::new(
            id.clone(),
            Arc::downgrade(&self.shared),
            parent,
            policy,
            Arc::clone(&self.shared.source),
            Arc::clone(&self.shared.shims),
        ));
        tracing::debug!(
            realm = %id,
            parent = ?parent.map(|p| p.id().as_str()),
            policy = realm.policy().name(),
            "realm created"
        );
        realms.insert(id, Arc::clone(&realm));
        Ok(realm)
    }

    pub fn realm(&self, id: &RealmId) -> Result<Arc<Realm>, GraphError> {
        self.shared
            .realms
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NoSuchRealm(id.clone()))
    }

    pub fn contains(&self, id: &RealmId) -> bool {
        self.shared.realms.read().contains_key(id)
    }

    /// All realms, sorted by id.
    pub fn realms(&self) -> Vec<Arc<Realm>> {
        self.shared.realms.read().values().cloned().collect()
    }

    pub fn realm_ids(&self) -> Vec<RealmId> {
        self.shared.realms.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.shared.realms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the parent relation.
    pub fn topology(&self) -> ParentGraph {
        let mut topology = ParentGraph::new();
        for realm in self.shared.realms.read().values() {
            match realm.parent() {
                Some(parent) => topology.add_edge(realm.id().clone(), parent.id().clone()),
                None => topology.add_root(realm.id().clone()),
            }
        }
        topology
    }

    pub fn children(&self, id: &RealmId) -> Vec<RealmId> {
        self.topology().children(id)
    }

    pub fn ancestors(&self, id: &RealmId) -> Vec<RealmId> {
        self.topology().ancestors(id)
    }

    pub fn descendants(&self, id: &RealmId) -> BTreeSet<RealmId> {
        self.topology().descendants(id)
    }

    /// In-memory bundles every realm in this graph can address as `mem:<bundle>`.
    pub fn memory(&self) -> &MemorySource {
        &self.shared.memory
    }

    pub fn source(&self) -> &Arc<dyn ArtifactSource> {
        &self.shared.source
    }

    pub fn shim_cache(&self) -> &Arc<ShimCache> {
        &self.shared.shims
    }

    pub fn default_policy(&self) -> &Arc<dyn OrderingPolicy> {
        &self.shared.default_policy
    }

    /// `describe` of every realm, sorted by id.
    pub fn describe(&self) -> String {
        self.realms().iter().map(|realm| realm.describe()).collect()
    }
}

impl std::fmt::Debug for RealmGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmGraph")
            .field("realms", &self.realm_ids())
            .field("default_policy", &self.shared.default_policy.name())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RealmGraph`].
#[derive(Default)]
pub struct RealmGraphBuilder {
    sources: Vec<Arc<dyn ArtifactSource>>,
    memory: Option<MemorySource>,
    shims: Option<Arc<ShimCache>>,
    default_policy: Option<Arc<dyn OrderingPolicy>>,
}

impl RealmGraphBuilder {
    /// Consult `source` before the filesystem and memory bundles.
    pub fn add_source(mut self, source: Arc<dyn ArtifactSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Share memory bundles with other graphs or the caller.
    pub fn memory(mut self, memory: MemorySource) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Use `shims` instead of the process-wide cache.
    pub fn shim_cache(mut self, shims: Arc<ShimCache>) -> Self {
        self.shims = Some(shims);
        self
    }

    pub fn default_policy(mut self, policy: Arc<dyn OrderingPolicy>) -> Self {
        self.default_policy = Some(policy);
        self
    }

    pub fn build(self) -> RealmGraph {
        let memory = self.memory.unwrap_or_default();
        let mut sources = self.sources;
        sources.push(Arc::new(FsSource::new()));
        sources.push(Arc::new(memory.clone()));

        RealmGraph::from_shared(Arc::new(GraphShared {
            realms: RwLock::new(BTreeMap::new()),
            source: Arc::new(SourceChain::new(sources)),
            memory,
            shims: self.shims.unwrap_or_else(ShimCache::process),
            default_policy: self
                .default_policy
                .unwrap_or_else(|| BuiltinPolicy::default().shared()),
        }))
    }
}
