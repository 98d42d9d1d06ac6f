//! world::policy
//!
//! Ordering policies: in which order a realm consults its own artifacts,
//! its imports and its parent.
//!
//! A realm's own cache of already-materialized artifacts is always checked
//! before any policy runs; the policy only orders the remaining sources.

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::realm::Realm;

/// One place a realm can look for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The realm's own search path (and shim synthesis, if enabled).
    Own,
    /// The first matching foreign import rule.
    Imports,
    /// The parent realm, subject to the parent import gate.
    Parent,
}

/// Decides the search order for a realm.
///
/// Implementations must be pure with respect to realm state at call time.
pub trait OrderingPolicy: Send + Sync + std::fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Ordered sources to try. Sources omitted from the result are skipped.
    fn order(&self, realm: &Realm) -> Cow<'static, [Source]>;
}

/// Error for unknown policy names.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown ordering policy '{0}' (expected self-first, imports-first or parent-first)")]
pub struct UnknownPolicy(pub String);

/// Built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinPolicy {
    /// Own, imports, parent.
    #[default]
    SelfFirst,
    /// Imports, own, parent.
    ImportsFirst,
    /// Imports, parent, own.
    ParentFirst,
}

impl BuiltinPolicy {
    pub const ALL: [BuiltinPolicy; 3] = [
        BuiltinPolicy::SelfFirst,
        BuiltinPolicy::ImportsFirst,
        BuiltinPolicy::ParentFirst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinPolicy::SelfFirst => "self-first",
            BuiltinPolicy::ImportsFirst => "imports-first",
            BuiltinPolicy::ParentFirst => "parent-first",
        }
    }

    /// Shared trait object for this policy.
    pub fn shared(self) -> Arc<dyn OrderingPolicy> {
        Arc::new(self)
    }
}

impl OrderingPolicy for BuiltinPolicy {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn order(&self, _realm: &Realm) -> Cow<'static, [Source]> {
        const SELF_FIRST: &[Source] = &[Source::Own, Source::Imports, Source::Parent];
        const IMPORTS_FIRST: &[Source] = &[Source::Imports, Source::Own, Source::Parent];
        const PARENT_FIRST: &[Source] = &[Source::Imports, Source::Parent, Source::Own];

        Cow::Borrowed(match self {
            BuiltinPolicy::SelfFirst => SELF_FIRST,
            BuiltinPolicy::ImportsFirst => IMPORTS_FIRST,
            BuiltinPolicy::ParentFirst => PARENT_FIRST,
        })
    }
}

impl FromStr for BuiltinPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuiltinPolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}

impl std::fmt::Display for BuiltinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for policy in BuiltinPolicy::ALL {
            assert_eq!(policy.as_str().parse::<BuiltinPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn unknown_name_rejected() {
        assert_eq!(
            "child-first".parse::<BuiltinPolicy>(),
            Err(UnknownPolicy("child-first".into()))
        );
    }

    #[test]
    fn default_is_self_first() {
        assert_eq!(BuiltinPolicy::default(), BuiltinPolicy::SelfFirst);
    }
}
