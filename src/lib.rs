//! Realmwork - namespace-isolated realms with import rules
//!
//! A realm is an independently configured namespace: it resolves names
//! from its own search path, from other realms it imports from, and from
//! an optional parent behind an import gate. A shim forge generates
//! trivial, distinctly named subtypes of resolved artifacts, defining each
//! shim at most once per process.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, drives the world)
//! - [`world`] - Realms, resolution, the realm graph
//! - [`forge`] - Shim synthesis and the process-wide shim cache
//! - [`core`] - Domain types, naming, patterns and configuration
//!
//! # Correctness Invariants
//!
//! 1. A realm materializes each name at most once
//! 2. Import routing does not depend on declaration order
//! 3. Each shim name is defined in the host at most once
//! 4. A missing name is an expected outcome; only shim conflicts are fatal

pub mod cli;
pub mod core;
pub mod forge;
pub mod world;
