//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Loads the realm graph through the [`Context`]
//! 3. Queries it and formats the output
//!
//! Handlers never change the world file.

mod completion;
mod describe;
mod resolve;
mod resources;
mod shim;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use describe::describe;
pub use resolve::{resolve, ResolveReport};
pub use resources::resources;
pub use shim::shim;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Describe { realm } => describe::describe(ctx, realm.as_deref()),
        Command::Resolve { realm, name, json } => resolve::resolve(ctx, &realm, &name, json),
        Command::Resources { realm, path } => resources::resources(ctx, &realm, &path),
        Command::Shim { realm, name } => shim::shim(ctx, &realm, &name),
        Command::Completion { shell } => completion::completion(shell),
    }
}
