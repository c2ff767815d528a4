// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Skip patterns
//!
//! A pattern is matched against an element id or a resource URL. `*` matches
//! any run of characters; everything else is literal.

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled skip pattern
#[derive(Debug, Clone)]
pub struct SkipPattern {
    source: String,
    regex: Regex,
}

impl SkipPattern {
    /// Compile a glob-style pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| Error::config(format!("invalid skip pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check a single value
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// An ordered set of skip patterns
#[derive(Debug, Clone, Default)]
pub struct SkipList {
    patterns: Vec<SkipPattern>,
}

impl SkipList {
    /// Compile every pattern; empty strings are ignored
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter(|p| !p.as_ref().trim().is_empty())
            .map(|p| SkipPattern::new(p.as_ref().trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Raw pattern strings, in order
    pub fn sources(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.source.clone()).collect()
    }

    /// True if the element id or URL matches any pattern
    pub fn is_skipped(&self, id: Option<&str>, url: Option<&str>) -> bool {
        self.patterns.iter().any(|p| {
            id.map(|v| p.matches(v)).unwrap_or(false) || url.map(|v| p.matches(v)).unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let p = SkipPattern::new("vendor-script").unwrap();
        assert!(p.matches("vendor-script"));
        assert!(!p.matches("vendor-script-2"));
    }

    #[test]
    fn test_glob_match() {
        let p = SkipPattern::new("https://cdn.example.com/*").unwrap();
        assert!(p.matches("https://cdn.example.com/lib/a.js"));
        assert!(!p.matches("https://other.example.com/a.js"));

        let p = SkipPattern::new("*.css").unwrap();
        assert!(p.matches("/assets/app.css"));
        assert!(!p.matches("/assets/app.css.map"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = SkipPattern::new("/a.js?v=1").unwrap();
        assert!(p.matches("/a.js?v=1"));
        assert!(!p.matches("/abjs?v=1"));
    }

    #[test]
    fn test_skip_list_by_id_or_url() {
        let list = SkipList::new(["analytics", "*/legacy/*", ""]).unwrap();
        assert_eq!(list.sources().len(), 2);
        assert!(list.is_skipped(Some("analytics"), Some("/main.js")));
        assert!(list.is_skipped(None, Some("/assets/legacy/x.js")));
        assert!(!list.is_skipped(Some("main"), Some("/main.js")));
        assert!(!SkipList::default().is_skipped(Some("analytics"), None));
    }
}
