//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--world <path>`: World config to load (default `realms.toml`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Realmwork - inspect namespace-isolated realms
#[derive(Parser, Debug)]
#[command(name = "rw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// World config to load
    #[arg(long, global = true, default_value = "realms.toml")]
    pub world: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump a realm and its ancestors
    #[command(
        name = "describe",
        long_about = "Print a realm's policy, search path and import rules, followed by \
            those of each ancestor.\n\n\
            Without a realm, every realm in the world is described.",
        after_help = "\
EXAMPLES:
    rw describe plugin
    rw --world deploy/realms.toml describe"
    )]
    Describe {
        /// Realm id
        realm: Option<String>,
    },

    /// Resolve a name as seen from a realm
    #[command(
        name = "resolve",
        long_about = "Resolve a symbol name from a realm and report which realm \
            materialized it, where it came from and its digest.\n\n\
            Exits non-zero if the name is not visible from the realm.",
        after_help = "\
EXAMPLES:
    rw resolve plugin svc.Widget
    rw resolve plugin svc.Widget --json"
    )]
    Resolve {
        /// Realm id
        realm: String,

        /// Symbol name (e.g. svc.Widget)
        name: String,

        /// Print a JSON object instead of text
        #[arg(long)]
        json: bool,
    },

    /// List every resource visible from a realm
    #[command(
        name = "resources",
        after_help = "\
EXAMPLES:
    rw resources plugin svc/config.toml"
    )]
    Resources {
        /// Realm id
        realm: String,

        /// Resource path (e.g. svc/config.toml)
        path: String,
    },

    /// Forge and materialize a shim of a name
    #[command(
        name = "shim",
        long_about = "Enable shims in a realm, forge a shim of the given name and \
            materialize it. Prints the generated shim name.",
        after_help = "\
EXAMPLES:
    rw shim plugin svc.Widget"
    )]
    Shim {
        /// Realm id
        realm: String,

        /// Name of the artifact to extend
        name: String,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for rw commands.",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    rw completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    rw completion zsh >> ~/.zshrc

    # Fish
    rw completion fish > ~/.config/fish/completions/rw.fish

    # PowerShell
    rw completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
