//! world::realm
//!
//! A realm: one isolated namespace with its own search path, import rules
//! and optional parent.
//!
//! # Resolution
//!
//! `resolve(name)`:
//!
//! 0. Return the realm's cached artifact for `name`, if any. Policy, imports
//!    and parent are not consulted.
//! 1. Ask the [`OrderingPolicy`] for a search order over own / imports /
//!    parent.
//! 2. Own: under the per-name lock, materialize from the search path (or
//!    the forge, for shim names in a shim-enabled realm) and cache.
//! 3. Imports: the first rule in total order whose pattern matches routes
//!    the lookup to its source realm.
//! 4. Parent: if the parent gate lets `name` through.
//!
//! Intermediate misses are silent; only [`ResolveError::ShimConflict`] and
//! [`ResolveError::ShimSynthesis`] cut a lookup short.
//!
//! # Invariants
//!
//! - A name is materialized at most once per realm; every caller observes
//!   the same `Arc<Artifact>` afterwards
//! - Import rules only grow; routing is independent of insertion order
//! - A realm never imports from itself; import cycles between realms are
//!   cut during lookup rather than recursing forever

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::RwLock;
use thiserror::Error;

use super::artifact::{Artifact, ResourceRef};
use super::graph::{GraphError, GraphShared, RealmGraph};
use super::import::{ImportError, ImportRule};
use super::locks::NameLocks;
use super::policy::{OrderingPolicy, Source};
use super::source::{normalize_resource_path, ArtifactSource};
use crate::core::naming::is_shim_name;
use crate::core::pattern::ImportPattern;
use crate::core::types::{Location, RealmId, SymbolName, TypeError};
use crate::forge::{self, ShimCache};

/// Errors from resolving a name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No visible source has the name. Expected; callers often fall back.
    #[error("not found: {0}")]
    NotFound(SymbolName),

    /// The host already owns the shim name and nothing cached can stand in
    /// for it. Fatal.
    #[error("shim conflict: '{0}' is predefined by the host and no cached shim exists")]
    ShimConflict(SymbolName),

    /// The synthesizer could not build the shim. Fatal.
    #[error("failed to synthesize shim '{name}': {reason}")]
    ShimSynthesis { name: SymbolName, reason: String },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// Errors from configuring or defining into a realm.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RealmError {
    #[error("'{name}' is already defined in realm '{realm}'")]
    AlreadyDefined { realm: RealmId, name: SymbolName },

    #[error(transparent)]
    InvalidLocation(#[from] TypeError),
}

/// Internal lookup result: `Ok(None)` is a miss, `Err` is always fatal.
pub(crate) type Lookup = Result<Option<Arc<Artifact>>, ResolveError>;

/// Realms visited by one top-level lookup.
#[derive(Debug, Default)]
pub(crate) struct Trail {
    /// Realms on the current delegation path.
    stack: Vec<RealmId>,
    /// Realms already fully searched for this name.
    searched: HashSet<RealmId>,
}

impl Trail {
    /// Returns false if `realm` must not be searched again.
    fn enter(&mut self, realm: &RealmId, name: &str) -> bool {
        if self.stack.contains(realm) {
            tracing::warn!(%realm, name, path = ?self.stack, "import cycle; skipping realm");
            return false;
        }
        if self.searched.contains(realm) {
            tracing::trace!(%realm, name, "realm already searched");
            return false;
        }
        self.stack.push(realm.clone());
        true
    }

    fn exit(&mut self, realm: &RealmId) {
        self.stack.pop();
        self.searched.insert(realm.clone());
    }
}

/// An isolated namespace.
pub struct Realm {
    id: RealmId,
    graph: Weak<GraphShared>,
    parent: Option<Weak<Realm>>,
    policy: Arc<dyn OrderingPolicy>,
    source: Arc<dyn ArtifactSource>,
    shims: Arc<ShimCache>,
    shims_enabled: AtomicBool,
    search_path: RwLock<Vec<Location>>,
    defined: RwLock<HashMap<SymbolName, Arc<Artifact>>>,
    locks: NameLocks,
    foreign_imports: RwLock<BTreeSet<ImportRule>>,
    parent_imports: RwLock<Option<BTreeSet<ImportRule>>>,
}

impl Realm {
    pub(crate) fn new(
        id: RealmId,
        graph: Weak<GraphShared>,
        parent: Option<&Arc<Realm>>,
        policy: Arc<dyn OrderingPolicy>,
        source: Arc<dyn ArtifactSource>,
        shims: Arc<ShimCache>,
    ) -> Self {
        Self {
            id,
            graph,
            parent: parent.map(Arc::downgrade),
            policy,
            source,
            shims,
            shims_enabled: AtomicBool::new(false),
            search_path: RwLock::new(Vec::new()),
            defined: RwLock::new(HashMap::new()),
            locks: NameLocks::new(),
            foreign_imports: RwLock::new(BTreeSet::new()),
            parent_imports: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &RealmId {
        &self.id
    }

    /// The owning graph, while it is alive.
    pub fn graph(&self) -> Option<RealmGraph> {
        self.graph.upgrade().map(RealmGraph::from_shared)
    }

    pub(crate) fn belongs_to(&self, graph: &Arc<GraphShared>) -> bool {
        std::ptr::eq(self.graph.as_ptr(), Arc::as_ptr(graph))
    }

    pub fn parent(&self) -> Option<Arc<Realm>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn policy(&self) -> &Arc<dyn OrderingPolicy> {
        &self.policy
    }

    pub fn shim_cache(&self) -> &Arc<ShimCache> {
        &self.shims
    }

    /// Let this realm materialize shim names through the forge.
    pub fn enable_shims(&self) {
        self.shims_enabled.store(true, Ordering::Release);
    }

    pub fn shims_enabled(&self) -> bool {
        self.shims_enabled.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Snapshot of the search path.
    pub fn search_path(&self) -> Vec<Location> {
        self.search_path.read().clone()
    }

    /// Parse and append a search path entry.
    ///
    /// Archive-root references are normalized (see [`Location::parse`]).
    /// Returns `Ok(false)` if the location was already present.
    ///
    /// # Errors
    ///
    /// `RealmError::InvalidLocation` for malformed references; the search
    /// path is left unchanged.
    pub fn add_search_path_entry(&self, reference: &str) -> Result<bool, RealmError> {
        let location = Location::parse(reference)?;
        Ok(self.add_location(location))
    }

    /// Append an already-parsed location. Returns false if it was present.
    pub fn add_location(&self, location: Location) -> bool {
        let mut path = self.search_path.write();
        if path.contains(&location) {
            return false;
        }
        tracing::debug!(realm = %self.id, %location, "search path entry added");
        path.push(location);
        true
    }

    /// Route names matching `pattern` to `source`.
    ///
    /// # Errors
    ///
    /// - [`ImportError::SelfImport`] if `source` is this realm
    /// - [`ImportError::ForeignRealm`] if `source` is in another graph
    pub fn declare_import(
        &self,
        source: &Arc<Realm>,
        pattern: impl Into<ImportPattern>,
    ) -> Result<(), ImportError> {
        if std::ptr::eq(Arc::as_ptr(source), self) || source.id == self.id {
            return Err(ImportError::SelfImport(self.id.clone()));
        }
        if !Weak::ptr_eq(&source.graph, &self.graph) {
            return Err(ImportError::ForeignRealm(source.id.clone()));
        }
        let rule = ImportRule::foreign(pattern.into(), source);
        tracing::debug!(realm = %self.id, %rule, "import declared");
        self.foreign_imports.write().insert(rule);
        Ok(())
    }

    /// Like [`declare_import`](Self::declare_import), naming the source by id.
    pub fn declare_import_from(
        &self,
        source: &RealmId,
        pattern: impl Into<ImportPattern>,
    ) -> Result<(), ImportError> {
        let realm = self
            .graph()
            .and_then(|graph| graph.realm(source).ok())
            .ok_or_else(|| ImportError::NoSuchRealm(source.clone()))?;
        self.declare_import(&realm, pattern)
    }

    /// Let names matching `pattern` fall through to the parent.
    ///
    /// The first call switches the parent gate from open (everything falls
    /// through) to gated (only matching names do).
    pub fn declare_parent_import(&self, pattern: impl Into<ImportPattern>) {
        let rule = ImportRule::parent(pattern.into());
        tracing::debug!(realm = %self.id, %rule, "parent import declared");
        self.parent_imports
            .write()
            .get_or_insert_with(BTreeSet::new)
            .insert(rule);
    }

    /// Install an empty parent import set: no name falls through to the
    /// parent until a parent import is declared.
    pub fn close_parent_gate(&self) {
        self.parent_imports.write().get_or_insert_with(BTreeSet::new);
    }

    /// Foreign import rules in match order.
    pub fn foreign_imports(&self) -> Vec<ImportRule> {
        self.foreign_imports.read().iter().cloned().collect()
    }

    /// Parent import rules in match order; `None` means the gate is open.
    pub fn parent_imports(&self) -> Option<Vec<ImportRule>> {
        self.parent_imports
            .read()
            .as_ref()
            .map(|rules| rules.iter().cloned().collect())
    }

    /// The realm the first matching foreign import routes `name` to.
    pub fn import_realm_for(&self, name: &str) -> Option<Arc<Realm>> {
        let imports = self.foreign_imports.read();
        imports
            .iter()
            .find(|rule| rule.matches(name))
            .and_then(ImportRule::source)
    }

    /// Every realm named by a foreign import, deduplicated, sorted by id.
    pub fn imported_realms(&self) -> Vec<Arc<Realm>> {
        let imports = self.foreign_imports.read();
        let mut realms = BTreeMap::new();
        for rule in imports.iter() {
            if let Some(realm) = rule.source() {
                realms.entry(realm.id.clone()).or_insert(realm);
            }
        }
        realms.into_values().collect()
    }

    /// Does the parent gate let `name` through?
    ///
    /// - no parent imports declared: always (open gate)
    /// - parent imports present but empty: never (closed gate)
    /// - otherwise: iff some parent import matches
    pub fn is_imported_from_parent(&self, name: &str) -> bool {
        match &*self.parent_imports.read() {
            None => true,
            Some(rules) => rules.iter().any(|rule| rule.matches(name)),
        }
    }

    /// Create a child realm in the owning graph with this realm as parent.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateId`] if `id` is taken
    /// - [`GraphError::Detached`] if the owning graph was dropped
    pub fn create_child(self: &Arc<Self>, id: RealmId) -> Result<Arc<Realm>, GraphError> {
        let graph = self.graph().ok_or(GraphError::Detached)?;
        graph.new_child_realm(id, self, None)
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    /// The artifact this realm already materialized for `name`, if any.
    pub fn find_loaded(&self, name: &SymbolName) -> Option<Arc<Artifact>> {
        self.defined.read().get(name).cloned()
    }

    /// Names materialized by this realm, sorted.
    pub fn loaded_names(&self) -> Vec<SymbolName> {
        let mut names: Vec<_> = self.defined.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Define `name` in this realm from host-provided bytes.
    ///
    /// # Errors
    ///
    /// `RealmError::AlreadyDefined` if this realm already has `name`.
    pub fn define(&self, name: &SymbolName, bytes: &[u8]) -> Result<Arc<Artifact>, RealmError> {
        let lock = self.locks.lock_for(name);
        let _guard = lock.lock();

        if self.find_loaded(name).is_some() {
            return Err(RealmError::AlreadyDefined {
                realm: self.id.clone(),
                name: name.clone(),
            });
        }
        let artifact = Arc::new(Artifact::defined(name.clone(), self.id.clone(), None, bytes));
        self.defined
            .write()
            .insert(name.clone(), Arc::clone(&artifact));
        tracing::debug!(realm = %self.id, %name, id = %artifact.id(), "artifact defined");
        Ok(artifact)
    }

    /// Resolve `name` as seen from this realm.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use realmwork::core::types::{RealmId, SymbolName};
    /// use realmwork::world::RealmGraph;
    ///
    /// let graph = RealmGraph::new();
    /// let a = graph.new_realm(RealmId::new("a").unwrap()).unwrap();
    /// let b = graph.new_realm(RealmId::new("b").unwrap()).unwrap();
    ///
    /// let widget = SymbolName::new("svc.Widget").unwrap();
    /// b.define(&widget, b"widget").unwrap();
    /// a.declare_import(&b, "svc.*").unwrap();
    ///
    /// let first = a.resolve(&widget).unwrap();
    /// let again = a.resolve(&widget).unwrap();
    /// assert!(Arc::ptr_eq(&first, &again));
    /// assert_eq!(first.realm().as_str(), "b");
    ///
    /// let other = SymbolName::new("other.Thing").unwrap();
    /// assert!(a.resolve(&other).unwrap_err().is_not_found());
    /// ```
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if no visible source has `name`
    /// - [`ResolveError::ShimConflict`] / [`ResolveError::ShimSynthesis`]
    ///   if a shim needed along the way cannot be materialized
    pub fn resolve(&self, name: &SymbolName) -> Result<Arc<Artifact>, ResolveError> {
        match self.lookup(name, &mut Trail::default())? {
            Some(artifact) => Ok(artifact),
            None => {
                tracing::debug!(realm = %self.id, %name, "not found");
                Err(ResolveError::NotFound(name.clone()))
            }
        }
    }

    /// Lookup with a fresh trail, for lookups of a different name issued
    /// while materializing (shim supertypes).
    pub(crate) fn lookup_fresh(&self, name: &SymbolName) -> Lookup {
        self.lookup(name, &mut Trail::default())
    }

    pub(crate) fn lookup(&self, name: &SymbolName, trail: &mut Trail) -> Lookup {
        if !trail.enter(&self.id, name.as_str()) {
            return Ok(None);
        }
        let found = self.lookup_entered(name, trail);
        trail.exit(&self.id);
        found
    }

    fn lookup_entered(&self, name: &SymbolName, trail: &mut Trail) -> Lookup {
        if let Some(hit) = self.find_loaded(name) {
            tracing::trace!(realm = %self.id, %name, "cached");
            return Ok(Some(hit));
        }

        for source in self.policy.order(self).iter() {
            let found = match source {
                Source::Own => self.load_from_self(name)?,
                Source::Imports => self.load_from_imports(name, trail)?,
                Source::Parent => self.load_from_parent(name, trail)?,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn load_from_self(&self, name: &SymbolName) -> Lookup {
        let lock = self.locks.lock_for(name);
        let _guard = lock.lock();

        // a racing thread may have finished while we waited
        if let Some(hit) = self.find_loaded(name) {
            return Ok(Some(hit));
        }

        let artifact = if self.shims_enabled() && is_shim_name(name.as_str()) {
            forge::materialize(self, name)?
        } else {
            self.read_from_search_path(name)
        };

        if let Some(artifact) = &artifact {
            self.defined
                .write()
                .insert(name.clone(), Arc::clone(artifact));
            tracing::debug!(realm = %self.id, %name, id = %artifact.id(), "materialized");
        }
        Ok(artifact)
    }

    fn read_from_search_path(&self, name: &SymbolName) -> Option<Arc<Artifact>> {
        // snapshot so no lock is held across I/O
        let path = self.search_path();
        for location in path {
            match self.source.load(&location, name) {
                Ok(Some(bytes)) => {
                    return Some(Arc::new(Artifact::defined(
                        name.clone(),
                        self.id.clone(),
                        Some(location),
                        &bytes,
                    )));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(realm = %self.id, %name, error = %e, "skipping unreadable location");
                }
            }
        }
        None
    }

    fn load_from_imports(&self, name: &SymbolName, trail: &mut Trail) -> Lookup {
        let Some(source) = self.import_realm_for(name.as_str()) else {
            return Ok(None);
        };
        tracing::trace!(realm = %self.id, %name, source = %source.id, "delegating to import");
        source.lookup(name, trail)
    }

    fn load_from_parent(&self, name: &SymbolName, trail: &mut Trail) -> Lookup {
        let Some(parent) = self.parent() else {
            return Ok(None);
        };
        if !self.is_imported_from_parent(name.as_str()) {
            return Ok(None);
        }
        tracing::trace!(realm = %self.id, %name, parent = %parent.id, "delegating to parent");
        parent.lookup(name, trail)
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// The first visible resource at `path`, in policy order.
    pub fn resource(&self, path: &str) -> Option<ResourceRef> {
        let path = normalize_resource_path(path)?;
        let mut found = IndexSet::new();
        self.collect_resources(&path, &mut Trail::default(), &mut found, true);
        found.into_iter().next()
    }

    /// Every visible resource at `path`: own, first matching import, gated
    /// parent, in policy order, without duplicates.
    pub fn resources(&self, path: &str) -> Vec<ResourceRef> {
        let Some(path) = normalize_resource_path(path) else {
            return Vec::new();
        };
        let mut found = IndexSet::new();
        self.collect_resources(&path, &mut Trail::default(), &mut found, false);
        found.into_iter().collect()
    }

    fn collect_resources(
        &self,
        path: &str,
        trail: &mut Trail,
        out: &mut IndexSet<ResourceRef>,
        first_only: bool,
    ) {
        if !trail.enter(&self.id, path) {
            return;
        }
        for source in self.policy.order(self).iter() {
            if first_only && !out.is_empty() {
                break;
            }
            match source {
                Source::Own => self.own_resources(path, out, first_only),
                Source::Imports => {
                    if let Some(realm) = self.import_realm_for(path) {
                        realm.collect_resources(path, trail, out, first_only);
                    }
                }
                Source::Parent => {
                    if let Some(parent) = self.parent() {
                        if self.is_imported_from_parent(path) {
                            parent.collect_resources(path, trail, out, first_only);
                        }
                    }
                }
            }
        }
        trail.exit(&self.id);
    }

    fn own_resources(&self, path: &str, out: &mut IndexSet<ResourceRef>, first_only: bool) {
        for location in self.search_path() {
            match self.source.find_resource(&location, path) {
                Ok(Some(found)) => {
                    out.insert(found);
                    if first_only {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(realm = %self.id, path, error = %e, "skipping unreadable location");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Human-readable dump of this realm and its ancestors.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(53);
        let _ = writeln!(out, "{rule}");

        self.describe_one(&mut out);
        let mut ancestor = self.parent();
        while let Some(realm) = ancestor {
            realm.describe_one(&mut out);
            ancestor = realm.parent();
        }

        let _ = writeln!(out, "{rule}");
        out
    }

    fn describe_one(&self, out: &mut String) {
        let _ = writeln!(out, "realm:    {}", self.id);
        let _ = writeln!(out, "policy:   {}", self.policy.name());
        if let Some(parent) = self.parent() {
            let _ = writeln!(out, "parent:   {}", parent.id);
        }
        if self.shims_enabled() {
            let _ = writeln!(out, "shims:    enabled");
        }
        for (i, location) in self.search_path.read().iter().enumerate() {
            let _ = writeln!(out, "search[{i}] = {location}");
        }
        let foreign = self.foreign_imports.read();
        let _ = writeln!(out, "foreign imports: {}", foreign.len());
        for rule in foreign.iter() {
            let _ = writeln!(out, "  import {rule}");
        }
        match &*self.parent_imports.read() {
            None => {
                let _ = writeln!(out, "parent imports: open");
            }
            Some(rules) => {
                let _ = writeln!(out, "parent imports: {}", rules.len());
                for rule in rules {
                    let _ = writeln!(out, "  import {rule}");
                }
            }
        }
        let _ = writeln!(out);
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("id", &self.id)
            .field("parent", &self.parent().map(|p| p.id.clone()))
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.parent() {
            Some(parent) => write!(f, "Realm[{}, parent: {}]", self.id, parent.id),
            None => write!(f, "Realm[{}]", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::policy::BuiltinPolicy;
    use std::thread;

    fn id(s: &str) -> RealmId {
        RealmId::new(s).unwrap()
    }

    fn name(s: &str) -> SymbolName {
        SymbolName::new(s).unwrap()
    }

    /// A realm whose search path is the memory bundle of the same id.
    fn realm_with(graph: &RealmGraph, realm: &str, artifacts: &[&str]) -> Arc<Realm> {
        for artifact in artifacts {
            graph
                .memory()
                .insert_artifact(realm, artifact, format!("{realm}:{artifact}").into_bytes());
        }
        let created = graph.new_realm(id(realm)).unwrap();
        created.add_search_path_entry(&format!("mem:{realm}")).unwrap();
        created
    }

    fn child_with(parent: &Arc<Realm>, realm: &str, artifacts: &[&str]) -> Arc<Realm> {
        let graph = parent.graph().unwrap();
        for artifact in artifacts {
            graph
                .memory()
                .insert_artifact(realm, artifact, format!("{realm}:{artifact}").into_bytes());
        }
        let created = parent.create_child(id(realm)).unwrap();
        created.add_search_path_entry(&format!("mem:{realm}")).unwrap();
        created
    }

    #[test]
    fn resolves_from_own_search_path_once() {
        let graph = RealmGraph::new();
        let core = realm_with(&graph, "core", &["svc.Widget"]);

        let first = core.resolve(&name("svc.Widget")).unwrap();
        let second = core.resolve(&name("svc.Widget")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.realm(), &id("core"));
        assert_eq!(first.location(), Some(&Location::Memory("core".into())));
        assert_eq!(core.loaded_names(), vec![name("svc.Widget")]);
    }

    #[test]
    fn missing_name_is_not_found() {
        let graph = RealmGraph::new();
        let core = realm_with(&graph, "core", &[]);
        let err = core.resolve(&name("svc.Missing")).unwrap_err();
        assert_eq!(err, ResolveError::NotFound(name("svc.Missing")));
    }

    #[test]
    fn define_twice_rejected() {
        let graph = RealmGraph::new();
        let core = graph.new_realm(id("core")).unwrap();
        core.define(&name("a.A"), b"one").unwrap();
        let err = core.define(&name("a.A"), b"two").unwrap_err();
        assert_eq!(
            err,
            RealmError::AlreadyDefined {
                realm: id("core"),
                name: name("a.A")
            }
        );
    }

    #[test]
    fn search_path_entries_deduplicated_and_validated() {
        let graph = RealmGraph::new();
        let core = graph.new_realm(id("core")).unwrap();
        assert!(core.add_search_path_entry("/opt/lib/").unwrap());
        assert!(!core.add_search_path_entry("file:/opt/lib").unwrap());
        assert!(matches!(
            core.add_search_path_entry("ftp://example.com/lib"),
            Err(RealmError::InvalidLocation(_))
        ));
        assert_eq!(core.search_path().len(), 1);
    }

    #[test]
    fn import_routes_matching_names() {
        let graph = RealmGraph::new();
        let api = realm_with(&graph, "api", &["svc.Widget", "other.Thing"]);
        let app = realm_with(&graph, "app", &[]);
        app.declare_import(&api, "svc.*").unwrap();

        let widget = app.resolve(&name("svc.Widget")).unwrap();
        assert_eq!(widget.realm(), &id("api"));
        assert!(app.resolve(&name("other.Thing")).unwrap_err().is_not_found());
        assert_eq!(app.import_realm_for("svc.Widget").unwrap().id(), &id("api"));
    }

    #[test]
    fn most_specific_import_wins_regardless_of_order() {
        for reversed in [false, true] {
            let graph = RealmGraph::new();
            let broad = realm_with(&graph, "broad", &["svc.core.Widget"]);
            let narrow = realm_with(&graph, "narrow", &["svc.core.Widget"]);
            let app = graph.new_realm(id("app")).unwrap();

            if reversed {
                app.declare_import(&narrow, "svc.core.*").unwrap();
                app.declare_import(&broad, "svc.*").unwrap();
            } else {
                app.declare_import(&broad, "svc.*").unwrap();
                app.declare_import(&narrow, "svc.core.*").unwrap();
            }

            let widget = app.resolve(&name("svc.core.Widget")).unwrap();
            assert_eq!(widget.realm(), &id("narrow"));
        }
    }

    #[test]
    fn import_errors() {
        let graph = RealmGraph::new();
        let other = RealmGraph::new();
        let app = graph.new_realm(id("app")).unwrap();
        let stranger = other.new_realm(id("stranger")).unwrap();

        assert_eq!(
            app.declare_import(&app, "svc.*").unwrap_err(),
            ImportError::SelfImport(id("app"))
        );
        assert_eq!(
            app.declare_import(&stranger, "svc.*").unwrap_err(),
            ImportError::ForeignRealm(id("stranger"))
        );
        assert_eq!(
            app.declare_import_from(&id("ghost"), "svc.*").unwrap_err(),
            ImportError::NoSuchRealm(id("ghost"))
        );
        assert!(app.foreign_imports().is_empty());
    }

    #[test]
    fn imported_realms_are_deduplicated() {
        let graph = RealmGraph::new();
        let api = graph.new_realm(id("api")).unwrap();
        let util = graph.new_realm(id("util")).unwrap();
        let app = graph.new_realm(id("app")).unwrap();
        app.declare_import(&util, "util.*").unwrap();
        app.declare_import(&api, "svc.*").unwrap();
        app.declare_import(&api, "=api.Entry").unwrap();

        let ids: Vec<_> = app.imported_realms().iter().map(|r| r.id().clone()).collect();
        assert_eq!(ids, vec![id("api"), id("util")]);
        assert_eq!(app.foreign_imports().len(), 3);
    }

    #[test]
    fn parent_gate_states() {
        let graph = RealmGraph::new();
        let parent = realm_with(&graph, "parent", &["api.Service", "impl.Hidden"]);

        let open = parent.create_child(id("open")).unwrap();
        assert!(open.parent_imports().is_none());
        assert!(open.is_imported_from_parent("anything.At.All"));
        assert!(open.resolve(&name("impl.Hidden")).is_ok());

        let gated = parent.create_child(id("gated")).unwrap();
        gated.declare_parent_import("api.*");
        assert!(gated.resolve(&name("api.Service")).is_ok());
        assert!(gated.resolve(&name("impl.Hidden")).unwrap_err().is_not_found());

        let closed = parent.create_child(id("closed")).unwrap();
        closed.close_parent_gate();
        assert_eq!(closed.parent_imports(), Some(Vec::new()));
        assert!(!closed.is_imported_from_parent("api.Service"));
        assert!(closed.resolve(&name("api.Service")).unwrap_err().is_not_found());
    }

    #[test]
    fn cached_artifact_checked_before_policy() {
        let graph = RealmGraph::new();
        let parent = realm_with(&graph, "parent", &[]);
        graph.memory().insert_artifact("child", "svc.Widget", b"own".to_vec());
        let child = graph
            .new_child_realm(id("child"), &parent, Some(BuiltinPolicy::ParentFirst.shared()))
            .unwrap();
        child.add_search_path_entry("mem:child").unwrap();

        let own = child.resolve(&name("svc.Widget")).unwrap();
        assert_eq!(own.realm(), &id("child"));

        // parent-first would now pick the parent, but the cached artifact wins
        graph.memory().insert_artifact("parent", "svc.Widget", b"late".to_vec());
        let again = child.resolve(&name("svc.Widget")).unwrap();
        assert!(Arc::ptr_eq(&own, &again));
    }

    #[test]
    fn policy_decides_between_own_and_parent() {
        let graph = RealmGraph::new();
        let parent = realm_with(&graph, "parent", &["svc.Widget"]);

        let own_first = child_with(&parent, "own", &["svc.Widget"]);
        assert_eq!(own_first.resolve(&name("svc.Widget")).unwrap().realm(), &id("own"));

        graph
            .memory()
            .insert_artifact("late", "svc.Widget", b"late".to_vec());
        let parent_first = graph
            .new_child_realm(id("late"), &parent, Some(BuiltinPolicy::ParentFirst.shared()))
            .unwrap();
        parent_first.add_search_path_entry("mem:late").unwrap();
        assert_eq!(
            parent_first.resolve(&name("svc.Widget")).unwrap().realm(),
            &id("parent")
        );
    }

    #[test]
    fn imports_first_prefers_import_over_own() {
        let graph = RealmGraph::new();
        let api = realm_with(&graph, "api", &["svc.Widget"]);
        graph.memory().insert_artifact("app", "svc.Widget", b"own".to_vec());
        let app = graph
            .new_realm_with_policy(id("app"), BuiltinPolicy::ImportsFirst.shared())
            .unwrap();
        app.add_search_path_entry("mem:app").unwrap();
        app.declare_import(&api, "svc.*").unwrap();

        assert_eq!(app.resolve(&name("svc.Widget")).unwrap().realm(), &id("api"));
    }

    #[test]
    fn import_cycle_terminates() {
        let graph = RealmGraph::new();
        let a = graph.new_realm(id("a")).unwrap();
        let b = graph.new_realm(id("b")).unwrap();
        a.declare_import(&b, "svc.*").unwrap();
        b.declare_import(&a, "svc.*").unwrap();

        assert!(a.resolve(&name("svc.Missing")).unwrap_err().is_not_found());
        assert!(b.resolve(&name("svc.Missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn child_importing_from_parent_terminates() {
        let graph = RealmGraph::new();
        let parent = realm_with(&graph, "parent", &[]);
        let child = parent.create_child(id("child")).unwrap();
        parent.declare_import(&child, "svc.*").unwrap();
        child.declare_import(&parent, "svc.*").unwrap();

        assert!(child.resolve(&name("svc.Missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn concurrent_resolution_materializes_once() {
        let graph = RealmGraph::new();
        let core = realm_with(&graph, "core", &["svc.Widget"]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let core = Arc::clone(&core);
                thread::spawn(move || core.resolve(&name("svc.Widget")).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for artifact in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], artifact));
        }
    }

    #[test]
    fn resources_gather_own_import_and_parent() {
        let graph = RealmGraph::new();
        for bundle in ["parent", "api", "app"] {
            graph
                .memory()
                .insert_resource(bundle, "svc/config.toml", b"x".to_vec());
        }
        let parent = realm_with(&graph, "parent", &[]);
        let api = realm_with(&graph, "api", &[]);
        let app = child_with(&parent, "app", &[]);
        app.declare_import(&api, "svc.*").unwrap();

        let found: Vec<_> = app
            .resources("/svc/config.toml")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            found,
            vec![
                "mem:app/svc/config.toml",
                "mem:api/svc/config.toml",
                "mem:parent/svc/config.toml"
            ]
        );
        assert_eq!(
            app.resource("svc/config.toml").unwrap().to_string(),
            "mem:app/svc/config.toml"
        );
        assert!(app.resource("svc/other.toml").is_none());
    }

    #[test]
    fn resources_shared_location_listed_once() {
        let graph = RealmGraph::new();
        for bundle in ["own", "shared", "base", "api"] {
            graph
                .memory()
                .insert_resource(bundle, "svc/config.toml", b"x".to_vec());
        }
        let parent = graph.new_realm(id("parent")).unwrap();
        parent.add_search_path_entry("mem:shared").unwrap();
        parent.add_search_path_entry("mem:base").unwrap();
        let api = graph.new_realm(id("api")).unwrap();
        api.add_search_path_entry("mem:shared").unwrap();
        api.add_search_path_entry("mem:api").unwrap();
        let app = parent.create_child(id("app")).unwrap();
        app.add_search_path_entry("mem:own").unwrap();
        app.add_search_path_entry("mem:shared").unwrap();
        app.declare_import(&api, "svc").unwrap();

        let found: Vec<_> = app
            .resources("svc/config.toml")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            found,
            vec![
                "mem:own/svc/config.toml",
                "mem:shared/svc/config.toml",
                "mem:api/svc/config.toml",
                "mem:base/svc/config.toml"
            ]
        );
    }

    #[test]
    fn resources_respect_parent_gate() {
        let graph = RealmGraph::new();
        graph
            .memory()
            .insert_resource("parent", "impl/secret.txt", b"x".to_vec());
        let parent = realm_with(&graph, "parent", &[]);
        let child = parent.create_child(id("child")).unwrap();
        child.declare_parent_import("api.*");

        assert!(child.resources("impl/secret.txt").is_empty());
        assert_eq!(parent.resources("impl/secret.txt").len(), 1);
    }

    #[test]
    fn describe_lists_realm_chain() {
        let graph = RealmGraph::new();
        let parent = graph.new_realm(id("parent")).unwrap();
        let api = graph.new_realm(id("api")).unwrap();
        let child = parent.create_child(id("child")).unwrap();
        child.add_search_path_entry("/opt/child").unwrap();
        child.declare_import(&api, "svc.*").unwrap();
        child.declare_parent_import("=api.Entry");

        let text = child.describe();
        assert!(text.contains("realm:    child"));
        assert!(text.contains("policy:   self-first"));
        assert!(text.contains("search[0] = file:/opt/child"));
        assert!(text.contains("foreign imports: 1"));
        assert!(text.contains("  import svc.* from api"));
        assert!(text.contains("parent imports: 1"));
        assert!(text.contains("realm:    parent"));
        assert!(text.contains("parent imports: open"));
        assert!(!text.contains("realm:    api"));
    }
}
