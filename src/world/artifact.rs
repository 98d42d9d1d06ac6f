//! world::artifact
//!
//! Materialized artifacts and resource references.
//!
//! Artifacts are immutable once built. Identity is `Arc` identity; the
//! [`ArtifactId`] gives the same answer without holding two `Arc`s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::core::types::{Fingerprint, Location, RealmId, SymbolName};
use crate::forge::ShimImage;

static NEXT_ARTIFACT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique artifact identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactId(u64);

impl ArtifactId {
    fn next() -> Self {
        Self(NEXT_ARTIFACT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an artifact came from.
#[derive(Debug)]
pub enum ArtifactOrigin {
    /// Bytes read from a search path location, or handed to
    /// [`Realm::define`](crate::world::Realm::define) (no location).
    Defined { location: Option<Location> },
    /// A synthesized subtype of `original`.
    Shim {
        original: Arc<Artifact>,
        image: ShimImage,
    },
}

/// A materialized artifact.
#[derive(Debug)]
pub struct Artifact {
    id: ArtifactId,
    name: SymbolName,
    realm: RealmId,
    digest: Fingerprint,
    origin: ArtifactOrigin,
}

impl Artifact {
    pub(crate) fn defined(
        name: SymbolName,
        realm: RealmId,
        location: Option<Location>,
        bytes: &[u8],
    ) -> Self {
        Self {
            id: ArtifactId::next(),
            name,
            realm,
            digest: Fingerprint::of(bytes),
            origin: ArtifactOrigin::Defined { location },
        }
    }

    pub(crate) fn shim(
        name: SymbolName,
        realm: RealmId,
        original: Arc<Artifact>,
        image: ShimImage,
    ) -> Self {
        Self {
            id: ArtifactId::next(),
            name,
            realm,
            digest: Fingerprint::of(image.as_bytes()),
            origin: ArtifactOrigin::Shim { original, image },
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn name(&self) -> &SymbolName {
        &self.name
    }

    /// The realm that materialized this artifact.
    pub fn realm(&self) -> &RealmId {
        &self.realm
    }

    pub fn digest(&self) -> &Fingerprint {
        &self.digest
    }

    pub fn origin(&self) -> &ArtifactOrigin {
        &self.origin
    }

    /// The search path location this artifact was read from, if any.
    pub fn location(&self) -> Option<&Location> {
        match &self.origin {
            ArtifactOrigin::Defined { location } => location.as_ref(),
            ArtifactOrigin::Shim { .. } => None,
        }
    }

    /// The supertype of a shim.
    pub fn supertype(&self) -> Option<&Arc<Artifact>> {
        match &self.origin {
            ArtifactOrigin::Shim { original, .. } => Some(original),
            ArtifactOrigin::Defined { .. } => None,
        }
    }

    pub fn is_shim(&self) -> bool {
        matches!(self.origin, ArtifactOrigin::Shim { .. })
    }

    /// True if `self` is `other` or a (transitive) shim of it.
    pub fn is_subtype_of(&self, other: &Artifact) -> bool {
        let mut current = Some(self);
        while let Some(artifact) = current {
            if artifact.id == other.id {
                return true;
            }
            current = artifact.supertype().map(Arc::as_ref);
        }
        false
    }
}

/// A resource visible from some realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub location: Location,
    pub path: String,
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = self.location.to_string();
        write!(f, "{}/{}", base.trim_end_matches('/'), self.path)
    }
}
