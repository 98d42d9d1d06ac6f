//! forge::shim
//!
//! Forging shim handles and materializing them.
//!
//! # Materialization
//!
//! Resolving a shim name `N` in a shim-enabled realm:
//!
//! 1. Global cache hit → done (built earlier, or by a racing forge)
//! 2. `N` does not decode to a different name → not found
//! 3. Resolve the decoded original through the realm's normal search
//! 4. Synthesize, define in the host, cache (see [`ShimCache`](super::ShimCache))
//!
//! The per-(realm, name) lock held by the realm around step 1–4 makes this
//! at-most-once per realm; the cache makes it at-most-once per process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::naming::{encode_shim_name, original_name};
use crate::core::types::SymbolName;
use crate::world::{Artifact, Lookup, Realm, ResolveError};

/// Materialize shim `name` for `realm`. `Ok(None)` means not found.
pub(crate) fn materialize(realm: &Realm, name: &SymbolName) -> Lookup {
    let cache = realm.shim_cache();
    if let Some(hit) = cache.get(name) {
        tracing::trace!(shim = %name, realm = %realm.id(), "shim cache hit");
        return Ok(Some(hit));
    }

    let decoded = original_name(name.as_str());
    if decoded == name.as_str() {
        return Ok(None);
    }
    let Ok(original) = SymbolName::new(decoded) else {
        tracing::debug!(shim = %name, "shim name decodes to an invalid symbol");
        return Ok(None);
    };

    let Some(supertype) = realm.lookup_fresh(&original)? else {
        tracing::debug!(shim = %name, %original, realm = %realm.id(), "shim supertype not found");
        return Ok(None);
    };

    cache
        .define_or_reuse(name, realm.id(), &supertype)
        .map(Some)
}

/// Generates shims of artifacts visible from one realm.
///
/// Creating a forge marks its realm shim-enabled: from then on the realm
/// materializes shim names on demand.
///
/// # Example
///
/// ```
/// use realmwork::core::types::{RealmId, SymbolName};
/// use realmwork::forge::ArtifactForge;
/// use realmwork::world::RealmGraph;
///
/// let graph = RealmGraph::new();
/// let realm = graph.new_realm(RealmId::new("core").unwrap()).unwrap();
/// let widget = SymbolName::new("svc.Widget").unwrap();
/// realm.define(&widget, b"widget").unwrap();
///
/// let forge = ArtifactForge::new(realm);
/// let handle = forge.forge_shim_of(&widget);
/// assert_eq!(handle.name().as_str(), "svc.Widget$__shim1");
///
/// let shim = handle.resolve().unwrap();
/// assert_eq!(shim.supertype().unwrap().name(), &widget);
/// ```
#[derive(Debug)]
pub struct ArtifactForge {
    realm: Arc<Realm>,
    counter: AtomicU64,
}

impl ArtifactForge {
    pub fn new(realm: Arc<Realm>) -> Self {
        realm.enable_shims();
        Self {
            realm,
            counter: AtomicU64::new(0),
        }
    }

    /// The realm shims are resolved in.
    pub fn realm(&self) -> &Arc<Realm> {
        &self.realm
    }

    /// Reserve a fresh shim name for `original` and return a lazy handle.
    ///
    /// Nothing is resolved or synthesized until the handle is resolved.
    pub fn forge_shim_of(&self, original: &SymbolName) -> ShimHandle {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        ShimHandle {
            name: SymbolName::from_validated(encode_shim_name(original.as_str(), counter)),
            realm: Arc::clone(&self.realm),
        }
    }

    /// Resolve any name through the forge's realm.
    pub fn load(&self, name: &SymbolName) -> Result<Arc<Artifact>, ResolveError> {
        self.realm.resolve(name)
    }
}

/// A lazily materialized shim.
#[derive(Debug, Clone)]
pub struct ShimHandle {
    name: SymbolName,
    realm: Arc<Realm>,
}

impl ShimHandle {
    /// The generated shim name.
    pub fn name(&self) -> &SymbolName {
        &self.name
    }

    /// The original name this shim extends.
    pub fn original(&self) -> &str {
        original_name(self.name.as_str())
    }

    /// Materialize the shim (first call) or return the existing one.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if the original is not visible from the realm
    /// - [`ResolveError::ShimConflict`] if the host owns the name already
    pub fn resolve(&self) -> Result<Arc<Artifact>, ResolveError> {
        self.realm.resolve(&self.name)
    }
}
