//! world::source
//!
//! Reading artifacts and resources out of search path locations.
//!
//! # Implementations
//!
//! - [`FsSource`]: directories on disk (`svc.Widget` → `<dir>/svc/Widget.art`)
//!   and zip archives (entry `svc/Widget.art`)
//! - [`MemorySource`]: named in-memory bundles (`mem:<name>` locations)
//! - [`SourceChain`]: first source that understands a location wins
//!
//! A source answers `Ok(None)` for locations it does not handle. Errors are
//! reserved for real read failures; realms log and skip them.

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::artifact::ResourceRef;
use crate::core::types::{Location, SymbolName};

/// Errors reading from a location.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read '{path}' from {location}: {source}")]
    Read {
        location: Location,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read archive {location}: {source}")]
    Archive {
        location: Location,
        source: ZipError,
    },
}

/// Reads artifact bytes and resources from locations.
pub trait ArtifactSource: Send + Sync + std::fmt::Debug {
    /// Bytes of artifact `name` stored at `location`, if present.
    fn load(&self, location: &Location, name: &SymbolName) -> Result<Option<Vec<u8>>, SourceError>;

    /// Resource `path` stored at `location`, if present.
    fn find_resource(&self, location: &Location, path: &str) -> Result<Option<ResourceRef>, SourceError>;
}

/// Normalize a resource path: no leading `/`, no `.`/`..` components.
///
/// Returns `None` for paths that would escape their location.
pub(crate) fn normalize_resource_path(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Filesystem-backed source.
///
/// A location whose path is a directory is read as a directory tree (or an
/// exploded archive). A location whose path is a regular file is read as a
/// zip archive with the same layout inside.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FsSource {
    pub fn new() -> Self {
        Self
    }

    fn read(location: &Location, dir: &Path, relative: &Path) -> Result<Option<Vec<u8>>, SourceError> {
        let path = dir.join(relative);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // a directory where the artifact would be, or a file where a
            // package directory would be
            Err(_) if !path.is_file() => Ok(None),
            Err(source) => Err(SourceError::Read {
                location: location.clone(),
                path,
                source,
            }),
        }
    }

    fn open_archive(location: &Location, archive: &Path) -> Result<ZipArchive<File>, SourceError> {
        let file = File::open(archive).map_err(|source| SourceError::Read {
            location: location.clone(),
            path: archive.to_path_buf(),
            source,
        })?;
        ZipArchive::new(file).map_err(|source| SourceError::Archive {
            location: location.clone(),
            source,
        })
    }

    fn read_entry(location: &Location, archive: &Path, entry: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let mut zip = Self::open_archive(location, archive)?;
        let mut file = match zip.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(SourceError::Archive {
                    location: location.clone(),
                    source,
                })
            }
        };
        if file.is_dir() {
            return Ok(None);
        }
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)
            .map_err(|source| SourceError::Read {
                location: location.clone(),
                path: archive.join(entry),
                source,
            })?;
        Ok(Some(bytes))
    }
}

impl ArtifactSource for FsSource {
    fn load(&self, location: &Location, name: &SymbolName) -> Result<Option<Vec<u8>>, SourceError> {
        let Some(path) = location.as_path() else {
            return Ok(None);
        };
        if path.is_dir() {
            Self::read(location, path, &name.artifact_path())
        } else if path.is_file() {
            Self::read_entry(location, path, &name.archive_entry())
        } else {
            Ok(None)
        }
    }

    fn find_resource(&self, location: &Location, path: &str) -> Result<Option<ResourceRef>, SourceError> {
        let Some(root) = location.as_path() else {
            return Ok(None);
        };
        let Some(path) = normalize_resource_path(path) else {
            return Ok(None);
        };
        let found = if root.is_dir() {
            root.join(&path).is_file()
        } else if root.is_file() {
            Self::open_archive(location, root)?
                .file_names()
                .any(|entry| entry == path)
        } else {
            false
        };
        Ok(found.then(|| ResourceRef {
            location: location.clone(),
            path,
        }))
    }
}

#[derive(Debug, Default)]
struct Bundle {
    artifacts: HashMap<SymbolName, Arc<[u8]>>,
    resources: HashMap<String, Arc<[u8]>>,
}

/// In-memory source for `mem:<bundle>` locations.
///
/// Thread-safe and cheap to clone; clones share the same bundles.
///
/// # Example
///
/// ```
/// use realmwork::core::types::{Location, SymbolName};
/// use realmwork::world::{ArtifactSource, MemorySource};
///
/// let source = MemorySource::new();
/// source.insert_artifact("core", "svc.Widget", b"widget".to_vec());
///
/// let location = Location::parse("mem:core").unwrap();
/// let name = SymbolName::new("svc.Widget").unwrap();
/// assert_eq!(source.load(&location, &name).unwrap().as_deref(), Some(&b"widget"[..]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bundles: Arc<RwLock<HashMap<String, Bundle>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store artifact bytes under `name` in `bundle`, replacing any previous bytes.
    ///
    /// Realms that already materialized `name` keep their artifact. An
    /// invalid `name` is ignored with a warning.
    pub fn insert_artifact(&self, bundle: &str, name: &str, bytes: Vec<u8>) {
        let name = match SymbolName::new(name) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(bundle, error = %e, "ignoring artifact with invalid name");
                return;
            }
        };
        self.bundles
            .write()
            .entry(bundle.to_string())
            .or_default()
            .artifacts
            .insert(name, bytes.into());
    }

    /// Store a resource at `path` in `bundle`.
    pub fn insert_resource(&self, bundle: &str, path: &str, bytes: Vec<u8>) {
        let Some(path) = normalize_resource_path(path) else {
            tracing::warn!(bundle, path, "ignoring resource with invalid path");
            return;
        };
        self.bundles
            .write()
            .entry(bundle.to_string())
            .or_default()
            .resources
            .insert(path, bytes.into());
    }

    /// Contents of a resource previously found through this source.
    pub fn resource_bytes(&self, resource: &ResourceRef) -> Option<Arc<[u8]>> {
        let Location::Memory(bundle) = &resource.location else {
            return None;
        };
        self.bundles
            .read()
            .get(bundle)
            .and_then(|b| b.resources.get(&resource.path))
            .cloned()
    }
}

impl ArtifactSource for MemorySource {
    fn load(&self, location: &Location, name: &SymbolName) -> Result<Option<Vec<u8>>, SourceError> {
        let Location::Memory(bundle) = location else {
            return Ok(None);
        };
        Ok(self
            .bundles
            .read()
            .get(bundle)
            .and_then(|b| b.artifacts.get(name))
            .map(|bytes| bytes.to_vec()))
    }

    fn find_resource(&self, location: &Location, path: &str) -> Result<Option<ResourceRef>, SourceError> {
        let Location::Memory(bundle) = location else {
            return Ok(None);
        };
        let Some(path) = normalize_resource_path(path) else {
            return Ok(None);
        };
        let found = self
            .bundles
            .read()
            .get(bundle)
            .is_some_and(|b| b.resources.contains_key(&path));
        Ok(found.then(|| ResourceRef {
            location: location.clone(),
            path,
        }))
    }
}

/// Tries each source in order.
#[derive(Debug, Clone, Default)]
pub struct SourceChain {
    sources: Vec<Arc<dyn ArtifactSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Arc<dyn ArtifactSource>>) -> Self {
        Self { sources }
    }

    /// Filesystem plus the given memory bundles.
    pub fn standard(memory: MemorySource) -> Self {
        Self::new(vec![Arc::new(FsSource::new()), Arc::new(memory)])
    }
}

impl ArtifactSource for SourceChain {
    fn load(&self, location: &Location, name: &SymbolName) -> Result<Option<Vec<u8>>, SourceError> {
        for source in &self.sources {
            if let Some(bytes) = source.load(location, name)? {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    fn find_resource(&self, location: &Location, path: &str) -> Result<Option<ResourceRef>, SourceError> {
        for source in &self.sources {
            if let Some(found) = source.find_resource(location, path)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}
