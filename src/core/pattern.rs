//! core::pattern
//!
//! Import patterns: which names an import rule applies to.
//!
//! # Syntax
//!
//! | Text        | Pattern               | Matches                                  |
//! |-------------|-----------------------|------------------------------------------|
//! | `svc.*`     | `Prefix("svc")`       | `svc`, `svc.Widget`, `svc/config.toml`   |
//! | `svc`       | `Prefix("svc")`       | same as above                            |
//! | `*` or `""` | `Prefix("")`          | every name                               |
//! | `=svc.Foo`  | `Exact("svc.Foo")`    | only `svc.Foo`                           |
//!
//! A prefix matches a name equal to it, or a name continuing with one of the
//! separators `.`, `/` or `$`. Resource paths are `/`-separated, so a dotted
//! prefix also matches by its slash form.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Separators that may follow a prefix.
const SEPARATORS: [char; 3] = ['.', '/', '$'];

/// Pattern half of an import rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImportPattern {
    /// Matches one name exactly.
    Exact(String),
    /// Matches a name and everything nested beneath it.
    Prefix(String),
}

impl ImportPattern {
    /// An exact-name pattern.
    pub fn exact(name: impl Into<String>) -> Self {
        ImportPattern::Exact(name.into())
    }

    /// A prefix (package) pattern. A trailing `.*` or `/` is ignored.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix
            .strip_suffix(".*")
            .or_else(|| prefix.strip_suffix("/*"))
            .unwrap_or(prefix.as_str())
            .trim_end_matches(['.', '/']);
        let trimmed = if trimmed == "*" { "" } else { trimmed };
        ImportPattern::Prefix(trimmed.to_string())
    }

    /// Parse the textual form described in the module docs.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_prefix('=') {
            Some(exact) => Self::exact(exact),
            None => Self::prefix(text),
        }
    }

    /// The bare pattern text (without `=` or `.*`).
    pub fn text(&self) -> &str {
        match self {
            ImportPattern::Exact(s) | ImportPattern::Prefix(s) => s,
        }
    }

    /// Does this pattern match `name`?
    ///
    /// # Example
    ///
    /// ```
    /// use realmwork::core::pattern::ImportPattern;
    ///
    /// let pkg = ImportPattern::parse("com.acme.*");
    /// assert!(pkg.matches("com.acme.Foo"));
    /// assert!(pkg.matches("com/acme/app.properties"));
    /// assert!(!pkg.matches("com.acmex.Foo"));
    /// assert!(!pkg.matches("org.other.Bar"));
    ///
    /// let exact = ImportPattern::parse("=com.acme.Foo");
    /// assert!(exact.matches("com.acme.Foo"));
    /// assert!(!exact.matches("com.acme.Foo$Inner"));
    /// ```
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ImportPattern::Exact(exact) => name == exact,
            ImportPattern::Prefix(prefix) if prefix.is_empty() => true,
            ImportPattern::Prefix(prefix) => {
                prefix_matches(prefix, name)
                    || (name.contains('/') && prefix_matches(&prefix.replace('.', "/"), name))
            }
        }
    }

    /// Pattern specificity: longer patterns are more specific.
    pub fn specificity(&self) -> usize {
        self.text().len()
    }

    fn kind_rank(&self) -> u8 {
        match self {
            ImportPattern::Exact(_) => 0,
            ImportPattern::Prefix(_) => 1,
        }
    }
}

fn prefix_matches(prefix: &str, name: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATORS),
        None => false,
    }
}

impl Ord for ImportPattern {
    /// Most specific first: longer text, then exact before prefix, then text.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .specificity()
            .cmp(&self.specificity())
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
            .then_with(|| self.text().cmp(other.text()))
    }
}

impl PartialOrd for ImportPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<String> for ImportPattern {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for ImportPattern {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<ImportPattern> for String {
    fn from(pattern: ImportPattern) -> Self {
        pattern.to_string()
    }
}

impl std::fmt::Display for ImportPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportPattern::Exact(name) => write!(f, "={name}"),
            ImportPattern::Prefix(p) if p.is_empty() => write!(f, "*"),
            ImportPattern::Prefix(p) => write!(f, "{p}.*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_forms_are_equivalent() {
        assert_eq!(ImportPattern::parse("svc.*"), ImportPattern::parse("svc"));
        assert_eq!(ImportPattern::parse("svc/"), ImportPattern::parse("svc"));
        assert_eq!(ImportPattern::parse("*"), ImportPattern::parse(""));
    }

    #[test]
    fn prefix_matches_self_and_nested() {
        let p = ImportPattern::parse("svc");
        assert!(p.matches("svc"));
        assert!(p.matches("svc.Widget"));
        assert!(p.matches("svc.deep.Widget"));
        assert!(p.matches("svc$Inner"));
        assert!(!p.matches("svcx.Widget"));
        assert!(!p.matches("other.svc"));
    }

    #[test]
    fn prefix_matches_resource_paths() {
        let p = ImportPattern::parse("com.acme");
        assert!(p.matches("com/acme/app.properties"));
        assert!(!p.matches("com/acmex/app.properties"));
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let all = ImportPattern::parse("*");
        assert!(all.matches("anything.At.All"));
        assert!(all.matches("x"));
    }

    #[test]
    fn exact_matches_only_itself() {
        let p = ImportPattern::parse("=svc.Widget");
        assert!(p.matches("svc.Widget"));
        assert!(!p.matches("svc.Widget.Inner"));
        assert!(!p.matches("svc"));
    }

    #[test]
    fn order_is_most_specific_first() {
        let mut patterns = vec![
            ImportPattern::parse("*"),
            ImportPattern::parse("a"),
            ImportPattern::parse("a.b.c"),
            ImportPattern::parse("=a.b.c"),
            ImportPattern::parse("a.b"),
        ];
        patterns.sort();
        let shown: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["=a.b.c", "a.b.c.*", "a.b.*", "a.*", "*"]);
    }

    #[test]
    fn display_parses_back() {
        for text in ["=a.B", "a.*", "*"] {
            assert_eq!(ImportPattern::parse(text).to_string(), text);
        }
    }
}
