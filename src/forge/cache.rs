//! forge::cache
//!
//! Process-wide define-or-reuse cache for shims.
//!
//! # Architecture
//!
//! One [`ShimCache`] exists per process ([`ShimCache::process`]) and is
//! shared by `Arc` with every realm graph and forge. Graphs built with an
//! explicit cache (tests, embedders with their own host) opt out of it. Shim names are only unique per
//! forge, so the cache is keyed by the full generated name: the first forge
//! to materialize a name wins and every later request, from any forge, gets
//! the winner's artifact.
//!
//! # Invariants
//!
//! - At most one artifact per shim name, for the lifetime of the cache
//! - Reads never block on a definition in progress for another name
//! - Definitions are serialized by the insertion lock; the host is asked at
//!   most once per name by this cache

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use super::image::StubSynthesizer;
use super::traits::{DefineError, ShimHost, ShimSynthesizer};
use super::ShimImage;
use crate::core::types::{RealmId, SymbolName};
use crate::world::{Artifact, ResolveError};

/// Host that enforces define-once for this process.
///
/// Names can be [`reserve`](ProcessHost::reserve)d to model artifacts the
/// environment predefined on its own.
#[derive(Debug, Default)]
pub struct ProcessHost {
    defined: Mutex<HashSet<SymbolName>>,
}

impl ProcessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as already bound by the environment.
    pub fn reserve(&self, name: &SymbolName) {
        self.defined.lock().insert(name.clone());
    }

    pub fn is_defined(&self, name: &SymbolName) -> bool {
        self.defined.lock().contains(name)
    }
}

impl ShimHost for ProcessHost {
    fn define(&self, name: &SymbolName, _image: &ShimImage) -> Result<(), DefineError> {
        if self.defined.lock().insert(name.clone()) {
            Ok(())
        } else {
            Err(DefineError::AlreadyDefined(name.clone()))
        }
    }
}

static PROCESS_CACHE: OnceLock<Arc<ShimCache>> = OnceLock::new();

/// Global shim cache.
#[derive(Debug)]
pub struct ShimCache {
    artifacts: RwLock<HashMap<SymbolName, Arc<Artifact>>>,
    insert_lock: Mutex<()>,
    host: Arc<dyn ShimHost>,
    synthesizer: Arc<dyn ShimSynthesizer>,
}

impl Default for ShimCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShimCache {
    /// Cache backed by a fresh [`ProcessHost`] and [`StubSynthesizer`].
    pub fn new() -> Self {
        Self::with_parts(Arc::new(ProcessHost::new()), Arc::new(StubSynthesizer))
    }

    /// The cache shared by the whole process, created on first use.
    ///
    /// Every [`RealmGraph`](crate::world::RealmGraph) built without an
    /// explicit cache uses this one.
    pub fn process() -> Arc<ShimCache> {
        Arc::clone(PROCESS_CACHE.get_or_init(|| Arc::new(ShimCache::new())))
    }

    pub fn with_host(host: Arc<dyn ShimHost>) -> Self {
        Self::with_parts(host, Arc::new(StubSynthesizer))
    }

    pub fn with_parts(host: Arc<dyn ShimHost>, synthesizer: Arc<dyn ShimSynthesizer>) -> Self {
        Self {
            artifacts: RwLock::new(HashMap::new()),
            insert_lock: Mutex::new(()),
            host,
            synthesizer,
        }
    }

    /// Cached shim for `name`, if one was materialized.
    pub fn get(&self, name: &SymbolName) -> Option<Arc<Artifact>> {
        self.artifacts.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn host(&self) -> &Arc<dyn ShimHost> {
        &self.host
    }

    /// Return the cached shim `name`, or synthesize, define and cache it.
    ///
    /// `realm` is recorded as the shim's defining realm; `original` becomes
    /// its supertype.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::ShimSynthesis`] if the synthesizer fails
    /// - [`ResolveError::ShimConflict`] if the host already owns `name` and
    ///   the cache has nothing to recover with. Fatal, never retried.
    pub(crate) fn define_or_reuse(
        &self,
        name: &SymbolName,
        realm: &RealmId,
        original: &Arc<Artifact>,
    ) -> Result<Arc<Artifact>, ResolveError> {
        let _guard = self.insert_lock.lock();

        if let Some(hit) = self.get(name) {
            tracing::trace!(shim = %name, "shim materialized concurrently");
            return Ok(hit);
        }

        let image = self
            .synthesizer
            .synthesize(name, original)
            .map_err(|e| ResolveError::ShimSynthesis {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        match self.host.define(name, &image) {
            Ok(()) => {
                let artifact = Arc::new(Artifact::shim(
                    name.clone(),
                    realm.clone(),
                    Arc::clone(original),
                    image,
                ));
                self.artifacts
                    .write()
                    .insert(name.clone(), Arc::clone(&artifact));
                tracing::debug!(shim = %name, supertype = %original.name(), %realm, "defined shim");
                Ok(artifact)
            }
            Err(DefineError::AlreadyDefined(_)) => {
                if let Some(existing) = self.get(name) {
                    return Ok(existing);
                }
                tracing::error!(shim = %name, "host already defines shim and no cached artifact exists");
                Err(ResolveError::ShimConflict(name.clone()))
            }
        }
    }
}
