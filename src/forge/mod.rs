//! forge
//!
//! Synthetic shim generation.
//!
//! # Architecture
//!
//! A shim is a public subtype of an existing artifact with one trivial
//! constructor: it behaves exactly like the original and exists only to
//! carry a new, distinct name.
//!
//! - [`ArtifactForge`] hands out [`ShimHandle`]s with generated names
//!   (see [`crate::core::naming`] for the scheme)
//! - [`ShimCache`] is the process-wide define-or-reuse store every forge
//!   shares, because a host may allow each name to be defined only once
//! - [`ShimSynthesizer`] and [`ShimHost`] are the host seams
//!
//! # Modules
//!
//! - `traits`: host seams and [`DefineError`]
//! - `image`: byte-level [`ShimImage`] and the default [`StubSynthesizer`]
//! - `cache`: [`ShimCache`] and the define-once [`ProcessHost`]
//! - `shim`: [`ArtifactForge`], [`ShimHandle`], materialization
//! - [`mock`]: recording host for tests

mod cache;
mod image;
pub mod mock;
mod shim;
mod traits;

pub use cache::{ProcessHost, ShimCache};
pub use image::{ImageError, Op, ShimImage, StubSynthesizer};
pub(crate) use shim::materialize;
pub use shim::{ArtifactForge, ShimHandle};
pub use traits::*;
