//! describe command - Dump realm configuration

use crate::cli::Context;
use anyhow::Result;

/// Print one realm and its ancestors, or every realm.
pub fn describe(ctx: &Context, realm: Option<&str>) -> Result<()> {
    match realm {
        Some(id) => {
            let (_graph, realm) = ctx.load_realm(id)?;
            print!("{}", realm.describe());
        }
        None => {
            let graph = ctx.load_graph()?;
            if graph.is_empty() && !ctx.quiet {
                println!("No realms defined in '{}'.", ctx.world.display());
            }
            print!("{}", graph.describe());
        }
    }
    Ok(())
}
