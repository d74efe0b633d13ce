//! Template-path matching.
//!
//! # Responsibilities
//! - Match an outbound path against configured template `href` prefixes
//! - Rewrite the matched prefix to the template's upstream path
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A trailing slash is ignored when matching
//! - First match wins (configuration order)
//! - No regex to guarantee O(n) matching

use crate::config::TemplatePath;

/// Matches a path against one template alias.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
    replacement: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// Rewrite `path` if it starts with this matcher's prefix.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        path.strip_prefix(&self.prefix)
            .map(|rest| format!("{}{}", self.replacement, rest))
    }
}

/// Ordered set of template aliases.
#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    matchers: Vec<PathPrefixMatcher>,
}

impl TemplateMatcher {
    pub fn from_config(paths: &[TemplatePath]) -> Self {
        Self {
            matchers: paths
                .iter()
                .map(|tp| PathPrefixMatcher::new(tp.href.clone(), tp.template.clone()))
                .collect(),
        }
    }

    /// Apply the first matching alias, or return `None`.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        self.matchers.iter().find_map(|m| m.rewrite(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(href: &str, template: &str) -> TemplatePath {
        TemplatePath {
            href: href.into(),
            label: href.into(),
            template: template.into(),
            weight: 0.0,
        }
    }

    #[test]
    fn test_prefix_rewrite() {
        let matcher = PathPrefixMatcher::new("/docs", "/templates/docs");
        assert_eq!(matcher.rewrite("/docs/intro").as_deref(), Some("/templates/docs/intro"));
        assert_eq!(matcher.rewrite("/images"), None);
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let matcher = TemplateMatcher::from_config(&[tp("/docs", "/t")]);
        assert_eq!(matcher.rewrite("/docs/").as_deref(), Some("/t"));
        assert_eq!(matcher.rewrite("/docs").as_deref(), Some("/t"));
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = TemplateMatcher::from_config(&[tp("/a", "/first"), tp("/a/b", "/second")]);
        assert_eq!(matcher.rewrite("/a/b/c").as_deref(), Some("/first/b/c"));
    }

    #[test]
    fn test_no_match() {
        let matcher = TemplateMatcher::from_config(&[tp("/docs", "/t")]);
        assert_eq!(matcher.rewrite("/blog"), None);
        assert_eq!(TemplateMatcher::default().rewrite("/blog"), None);
    }
}
