// Pattern Matching Utilities
// Glob-like matching of path components for walk exclusions

use std::path::Path;

/// Check if a single file or directory name matches a pattern
///
/// `*suffix`, `prefix*` and `pre*post` are supported, anything else must
/// match the whole name.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        name.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        name.starts_with(prefix)
    } else if let Some((head, tail)) = pattern.split_once('*') {
        name.len() >= head.len() + tail.len() && name.starts_with(head) && name.ends_with(tail)
    } else {
        name == pattern
    }
}

/// Pattern matcher for walk exclusions
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<String>,
}

impl PatternMatcher {
    /// Create a new pattern matcher with the given patterns
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Check whether any component of `relative` is excluded
    pub fn should_exclude(&self, relative: &Path) -> bool {
        relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            self.patterns.iter().any(|p| matches_pattern(&name, p))
        })
    }
}
