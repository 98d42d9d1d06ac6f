//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`SymbolName`] - Validated dotted artifact name
//! - [`RealmId`] - Validated realm identifier
//! - [`Location`] - Search path entry (normalized)
//! - [`Fingerprint`] - SHA-256 digest of artifact bytes
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so resolution code never re-checks them.
//!
//! # Examples
//!
//! ```
//! use realmwork::core::types::{Location, RealmId, SymbolName};
//!
//! let name = SymbolName::new("svc.Widget").unwrap();
//! let realm = RealmId::new("plugin.alpha").unwrap();
//! let location = Location::parse("jar:file:/opt/svc.jar!/").unwrap();
//! assert_eq!(location.to_string(), "file:/opt/svc.jar");
//!
//! assert!(SymbolName::new("svc..Widget").is_err());
//! assert!(RealmId::new("has space").is_err());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid symbol name: {0}")]
    InvalidSymbolName(String),

    #[error("invalid realm id: {0}")]
    InvalidRealmId(String),

    #[error("invalid location '{reference}': {reason}")]
    InvalidLocation { reference: String, reason: String },
}

/// A validated artifact name.
///
/// Names are dotted (`svc.Widget`), may use `$` for nested artifacts
/// (`svc.Widget$Inner`) and never contain whitespace or control characters.
///
/// Rules:
/// - Cannot be empty
/// - Cannot start or end with `.`
/// - Cannot contain `..`, whitespace, `/` or ASCII control characters
///
/// # Example
///
/// ```
/// use realmwork::core::types::SymbolName;
///
/// let name = SymbolName::new("svc.Widget$Inner").unwrap();
/// assert_eq!(name.as_str(), "svc.Widget$Inner");
/// assert_eq!(name.package(), Some("svc"));
///
/// assert!(SymbolName::new("").is_err());
/// assert!(SymbolName::new(".svc").is_err());
/// assert!(SymbolName::new("svc/Widget").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolName(String);

impl SymbolName {
    /// Create a new validated symbol name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSymbolName` if the name violates the rules above.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Wrap a name derived from an already-valid name by a rule that
    /// preserves validity (shim encoding).
    pub(crate) fn from_validated(name: String) -> Self {
        debug_assert!(Self::validate(&name).is_ok(), "invalid derived name {name:?}");
        Self(name)
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidSymbolName(
                "symbol name cannot be empty".into(),
            ));
        }
        if name.starts_with('.') || name.ends_with('.') {
            return Err(TypeError::InvalidSymbolName(format!(
                "'{name}' cannot start or end with '.'"
            )));
        }
        if name.contains("..") {
            return Err(TypeError::InvalidSymbolName(format!(
                "'{name}' cannot contain '..'"
            )));
        }
        if name.contains('/') {
            return Err(TypeError::InvalidSymbolName(format!(
                "'{name}' cannot contain '/' (resource paths are not symbols)"
            )));
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_ascii_control())
        {
            return Err(TypeError::InvalidSymbolName(format!(
                "'{}' cannot contain whitespace or control characters",
                name.escape_debug()
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dotted package part of the name, if any.
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('.').map(|idx| &self.0[..idx])
    }

    /// Relative path of this artifact inside a directory location.
    ///
    /// `svc.Widget` maps to `svc/Widget.art`.
    pub fn artifact_path(&self) -> PathBuf {
        let mut path: PathBuf = self.0.split('.').collect();
        path.set_extension(ARTIFACT_EXTENSION);
        path
    }

    /// Entry name of this artifact inside an archive location.
    ///
    /// `svc.Widget` maps to `svc/Widget.art`.
    pub fn archive_entry(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.0.replace('.', "/"))
    }
}

/// File extension used for artifacts stored in directory and archive locations.
pub const ARTIFACT_EXTENSION: &str = "art";

impl TryFrom<String> for SymbolName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SymbolName> for String {
    fn from(name: SymbolName) -> Self {
        name.0
    }
}

impl AsRef<str> for SymbolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymbolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated realm identifier.
///
/// Ids are unique within one [`RealmGraph`](crate::world::RealmGraph) and
/// consist of ASCII alphanumerics plus `.`, `-`, `_`, `:`, `/`, `@` and `+`.
///
/// # Example
///
/// ```
/// use realmwork::core::types::RealmId;
///
/// assert!(RealmId::new("plexus.core").is_ok());
/// assert!(RealmId::new("plugin:alpha@1.0").is_ok());
/// assert!(RealmId::new("").is_err());
/// assert!(RealmId::new("a b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RealmId(String);

impl RealmId {
    const MAX_LEN: usize = 256;

    /// Create a new validated realm id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRealmId` if the id is empty, too long, or
    /// contains characters outside the allowed set.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidRealmId("realm id cannot be empty".into()));
        }
        if id.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidRealmId(format!(
                "realm id longer than {} bytes",
                Self::MAX_LEN
            )));
        }
        const EXTRA: [char; 7] = ['.', '-', '_', ':', '/', '@', '+'];
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || EXTRA.contains(c)))
        {
            return Err(TypeError::InvalidRealmId(format!(
                "'{}' contains invalid character '{}'",
                id.escape_debug(),
                c.escape_debug()
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RealmId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RealmId> for String {
    fn from(id: RealmId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RealmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A search path entry.
///
/// Locations are parsed from references such as `file:/opt/lib/`,
/// `/opt/lib`, `jar:file:/opt/svc.jar!/` or `mem:bundle`. Archive-root
/// references (`jar:<inner>!/`, `archive:<inner>!/`) are normalized to the
/// inner reference, so an archive has exactly one spelling on a search path.
/// Trailing slashes on file references are dropped for the same reason.
///
/// # Example
///
/// ```
/// use realmwork::core::types::Location;
///
/// let a = Location::parse("jar:file:/opt/svc.jar!/").unwrap();
/// let b = Location::parse("file:/opt/svc.jar").unwrap();
/// assert_eq!(a, b);
///
/// let mem = Location::parse("mem:core").unwrap();
/// assert_eq!(mem.to_string(), "mem:core");
///
/// assert!(Location::parse("").is_err());
/// assert!(Location::parse("http://example.com/lib").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Location {
    /// A directory, exploded archive or zip archive on the local filesystem.
    File(PathBuf),
    /// A named in-memory bundle.
    Memory(String),
}

impl Location {
    /// Parse a location reference.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLocation` for empty references, unknown
    /// schemes, nested archive entries and empty paths.
    pub fn parse(reference: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidLocation {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty reference"));
        }
        if trimmed.contains('\0') {
            return Err(invalid("reference contains NUL"));
        }

        for scheme in ["jar:", "archive:"] {
            if let Some(rest) = trimmed.strip_prefix(scheme) {
                let inner = rest
                    .strip_suffix("!/")
                    .ok_or_else(|| invalid("archive reference must end with '!/'"))?;
                if inner.contains("!/") {
                    return Err(invalid("nested archive entries are not supported"));
                }
                return Self::parse(inner).map_err(|_| invalid("malformed archive target"));
            }
        }

        if let Some(key) = trimmed.strip_prefix("mem:") {
            if key.is_empty() {
                return Err(invalid("empty memory bundle name"));
            }
            return Ok(Location::Memory(key.to_string()));
        }

        let path = if let Some(rest) = trimmed.strip_prefix("file:") {
            // file:///abs and file:/abs are both accepted
            rest.strip_prefix("//").unwrap_or(rest)
        } else if has_scheme(trimmed) {
            return Err(invalid("unsupported scheme"));
        } else {
            trimmed
        };

        let path = path.trim_end_matches('/');
        if path.is_empty() {
            // "file:/" and "/" both name the filesystem root
            if trimmed.ends_with('/') {
                return Ok(Location::File(PathBuf::from("/")));
            }
            return Err(invalid("empty path"));
        }
        Ok(Location::File(PathBuf::from(path)))
    }

    /// The filesystem path, for file locations.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::File(path) => Some(path),
            Location::Memory(_) => None,
        }
    }
}

/// True if `reference` starts with a URL scheme (`name:`), ignoring
/// single-letter drive prefixes such as `C:`.
fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(idx) if idx > 1 => reference[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

impl TryFrom<String> for Location {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl std::str::FromStr for Location {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File(path) => write!(f, "file:{}", path.display()),
            Location::Memory(key) => write!(f, "mem:{key}"),
        }
    }
}

/// SHA-256 digest of the bytes an artifact was defined from.
///
/// # Example
///
/// ```
/// use realmwork::core::types::Fingerprint;
///
/// let a = Fingerprint::of(b"widget");
/// let b = Fingerprint::of(b"widget");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// assert_eq!(a.short(8).len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
