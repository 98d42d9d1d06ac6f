//! resources command - List resources visible from a realm

use crate::cli::Context;
use anyhow::{bail, Result};

/// Print every resource at `path` visible from `realm`, one per line.
pub fn resources(ctx: &Context, realm: &str, path: &str) -> Result<()> {
    let (_graph, realm) = ctx.load_realm(realm)?;

    let found = realm.resources(path);
    if found.is_empty() {
        bail!("No resource '{}' visible from realm '{}'", path, realm.id());
    }
    for resource in found {
        println!("{resource}");
    }
    Ok(())
}
