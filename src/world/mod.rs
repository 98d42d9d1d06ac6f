//! world
//!
//! Realms and the graph that owns them.
//!
//! # Modules
//!
//! - `artifact`: resolved [`Artifact`]s and [`ResourceRef`]s
//! - `policy`: [`OrderingPolicy`] and the built-in orders
//! - `source`: where search path entries are read from
//! - `import`: [`ImportRule`] and its total order
//! - `locks`: per-name locks
//! - `realm`: [`Realm`] and resolution
//! - `graph`: [`RealmGraph`], the owner of realms

mod artifact;
mod graph;
mod import;
mod locks;
mod policy;
mod realm;
mod source;

pub use artifact::{Artifact, ArtifactId, ArtifactOrigin, ResourceRef};
pub use graph::{GraphError, RealmGraph, RealmGraphBuilder};
pub use import::{ImportError, ImportRule};
pub use policy::{BuiltinPolicy, OrderingPolicy, Source, UnknownPolicy};
pub(crate) use realm::Lookup;
pub use realm::{Realm, RealmError, ResolveError};
pub use source::{ArtifactSource, FsSource, MemorySource, SourceChain, SourceError};
