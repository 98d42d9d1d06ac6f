//! forge::traits
//!
//! Host seams for the shim forge.
//!
//! # Design
//!
//! The forge needs two things from its host environment:
//!
//! - a way to turn an existing artifact into a shim image
//!   ([`ShimSynthesizer`]), and
//! - a place to define the image under its generated name ([`ShimHost`]).
//!
//! A host may refuse to define the same name twice for the lifetime of the
//! process, even when the second definition comes from an unrelated realm.
//! That refusal is reported as [`DefineError::AlreadyDefined`]; the
//! [`ShimCache`](super::ShimCache) decides whether it can recover.

use thiserror::Error;

use super::image::{ImageError, ShimImage};
use crate::core::types::SymbolName;
use crate::world::Artifact;

/// Errors from defining a shim in the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefineError {
    /// The host already has an artifact bound to this name.
    #[error("'{0}' is already defined in this process")]
    AlreadyDefined(SymbolName),
}

/// Produces shim images.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one synthesizer is shared by every
/// forge using a given cache.
pub trait ShimSynthesizer: Send + Sync + std::fmt::Debug {
    /// Build a shim named `shim` that behaves exactly like `original`.
    fn synthesize(&self, shim: &SymbolName, original: &Artifact) -> Result<ShimImage, ImageError>;
}

/// The host environment's definition store.
pub trait ShimHost: Send + Sync + std::fmt::Debug {
    /// Bind `image` to `name`.
    fn define(&self, name: &SymbolName, image: &ShimImage) -> Result<(), DefineError>;
}
