//! shim command - Forge and materialize one shim

use crate::cli::Context;
use crate::core::types::SymbolName;
use crate::forge::ArtifactForge;
use anyhow::{Context as _, Result};

/// Forge a shim of `name` in `realm` and print the generated name.
pub fn shim(ctx: &Context, realm: &str, name: &str) -> Result<()> {
    let name = SymbolName::new(name).with_context(|| format!("Invalid name '{name}'"))?;
    let (_graph, realm) = ctx.load_realm(realm)?;

    let forge = ArtifactForge::new(realm);
    let handle = forge.forge_shim_of(&name);
    let shim = handle
        .resolve()
        .with_context(|| format!("Cannot materialize a shim of '{name}'"))?;

    println!("{}", shim.name());
    if !ctx.quiet {
        if let Some(original) = shim.supertype() {
            println!("extends {} from realm '{}'", original.name(), original.realm());
        }
    }
    Ok(())
}
