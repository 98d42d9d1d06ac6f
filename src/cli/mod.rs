//! cli
//!
//! Command-line interface layer for Realmwork.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the world config into a realm graph
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a
//! [`RealmGraph`](crate::world::RealmGraph) from the world file and hands it
//! to the command handlers, which only query it.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::{Config, WorldFile};
use crate::core::types::RealmId;
use crate::forge::ShimCache;
use crate::world::{Realm, RealmGraph};

/// Shared state for command handlers.
#[derive(Debug)]
pub struct Context {
    /// World config path
    pub world: PathBuf,
    /// Minimal output
    pub quiet: bool,
    /// Loaded global configuration
    pub config: Config,
}

impl Context {
    /// Build the realm graph described by the world file.
    pub fn load_graph(&self) -> Result<RealmGraph> {
        let world = WorldFile::load(&self.world)
            .with_context(|| format!("Failed to load world '{}'", self.world.display()))?;
        let graph = RealmGraph::builder()
            .shim_cache(ShimCache::process())
            .default_policy(self.config.default_policy().shared())
            .build();
        world
            .build_with(graph)
            .with_context(|| format!("Invalid world '{}'", self.world.display()))
    }

    /// Load the graph and look up one realm in it.
    pub fn load_realm(&self, id: &str) -> Result<(RealmGraph, std::sync::Arc<Realm>)> {
        let id = RealmId::new(id).with_context(|| format!("Invalid realm id '{id}'"))?;
        let graph = self.load_graph()?;
        let realm = graph.realm(&id)?;
        Ok((graph, realm))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`, after logging is set up.
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Context {
        world: cli.world,
        quiet: cli.quiet,
        config,
    };

    commands::dispatch(cli.command, &ctx)
}
