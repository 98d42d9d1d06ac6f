//! resolve command - Resolve a name from a realm
//!
//! Exits non-zero when the name is not visible; `--json` emits a
//! [`ResolveReport`].

use crate::cli::Context;
use crate::core::types::SymbolName;
use crate::world::{Artifact, ArtifactOrigin};
use anyhow::{Context as _, Result};
use serde::Serialize;

/// Machine-readable resolution result.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ResolveReport {
    pub name: String,
    /// Realm that materialized the artifact.
    pub realm: String,
    /// Search path location, for artifacts read from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Original name, for shims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shim_of: Option<String>,
    pub digest: String,
}

impl ResolveReport {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        let (location, shim_of) = match artifact.origin() {
            ArtifactOrigin::Defined { location } => (location.as_ref().map(ToString::to_string), None),
            ArtifactOrigin::Shim { original, .. } => (None, Some(original.name().to_string())),
        };
        Self {
            name: artifact.name().to_string(),
            realm: artifact.realm().to_string(),
            location,
            shim_of,
            digest: artifact.digest().to_string(),
        }
    }
}

/// Resolve `name` as seen from realm `realm`.
pub fn resolve(ctx: &Context, realm: &str, name: &str, json: bool) -> Result<()> {
    let name = SymbolName::new(name).with_context(|| format!("Invalid name '{name}'"))?;
    let (_graph, realm) = ctx.load_realm(realm)?;

    let artifact = realm
        .resolve(&name)
        .with_context(|| format!("Cannot resolve '{}' from realm '{}'", name, realm.id()))?;
    let report = ResolveReport::from_artifact(&artifact);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if ctx.quiet {
        println!("{}", report.realm);
        return Ok(());
    }

    println!("name:   {}", report.name);
    println!("realm:  {}", report.realm);
    match (&report.location, &report.shim_of) {
        (Some(location), _) => println!("origin: {location}"),
        (None, Some(original)) => println!("origin: shim of {original}"),
        (None, None) => println!("origin: defined"),
    }
    println!("digest: {}", report.digest);
    Ok(())
}
