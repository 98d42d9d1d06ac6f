//! core
//!
//! Core domain types, naming rules and configuration for Realmwork.
//!
//! # Modules
//!
//! - [`types`] - Strong types: SymbolName, RealmId, Location, Fingerprint
//! - [`naming`] - Shim name encoding and decoding
//! - [`pattern`] - Import patterns and their specificity order
//! - [`graph`] - Parent-link topology and cycle detection
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names and locations at the boundary
//! - Schemas are strict and self-describing
//! - Everything here is deterministic and free of shared state

pub mod config;
pub mod graph;
pub mod naming;
pub mod pattern;
pub mod types;
