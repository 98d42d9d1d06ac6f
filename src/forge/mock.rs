//! forge::mock
//!
//! Mock shim host for deterministic testing.
//!
//! # Design
//!
//! The mock host records every definition request and can be told to
//! refuse specific names, which simulates an environment that predefined
//! them. An optional delay widens race windows in concurrency tests.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use realmwork::core::types::SymbolName;
//! use realmwork::forge::mock::{MockHost, MockOperation};
//! use realmwork::forge::{ShimHost, ShimImage};
//!
//! let host = MockHost::new();
//! let name = SymbolName::new("svc.Widget$__shim1").unwrap();
//! let image = ShimImage::stub(name.as_str(), "svc.Widget").unwrap();
//!
//! host.define(&name, &image).unwrap();
//! assert!(host.define(&name, &image).is_err());
//! assert_eq!(host.define_count(&name), 2);
//! assert!(matches!(&host.operations()[0], MockOperation::Define { accepted: true, .. }));
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::image::ShimImage;
use super::traits::{DefineError, ShimHost};
use crate::core::types::SymbolName;

/// Mock host for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<MockHostInner>>,
}

#[derive(Debug, Default)]
struct MockHostInner {
    /// Names bound so far (including refused-in-advance ones).
    defined: HashSet<SymbolName>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
    /// Sleep inside `define` before answering.
    delay: Option<Duration>,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Define {
        name: SymbolName,
        supertype: String,
        accepted: bool,
    },
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `name` as predefined by the environment.
    pub fn predefine(&self, name: &SymbolName) {
        self.inner.lock().defined.insert(name.clone());
    }

    /// Sleep for `delay` in every `define` call.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    /// All recorded operations, oldest first.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().operations.clone()
    }

    /// How many times `define` was asked for `name`.
    pub fn define_count(&self, name: &SymbolName) -> usize {
        self.inner
            .lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::Define { name: n, .. } if n == name))
            .count()
    }
}

impl ShimHost for MockHost {
    fn define(&self, name: &SymbolName, image: &ShimImage) -> Result<(), DefineError> {
        let delay = self.inner.lock().delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut inner = self.inner.lock();
        let accepted = inner.defined.insert(name.clone());
        inner.operations.push(MockOperation::Define {
            name: name.clone(),
            supertype: image.supertype().to_string(),
            accepted,
        });

        if accepted {
            Ok(())
        } else {
            Err(DefineError::AlreadyDefined(name.clone()))
        }
    }
}
