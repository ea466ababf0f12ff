//! Pattern-based filtering for file discovery.
//!
//! Provides glob-style pattern matching for filtering discovered files.
//! Supports both single patterns and multiple patterns with OR logic.

use glob::Pattern;
use pf_error::{PfError, Result};

use super::Filter;
use crate::s3::S3Object;

/// A filter for matching file keys against a single glob pattern.
///
/// Matches against the filename portion of the key (after the last `/`),
/// not the full key path. This allows patterns like `*.parquet` to match
/// files in any directory.
///
/// # Pattern Syntax
///
/// - `*` matches any sequence of characters (except `/`)
/// - `?` matches any single character
/// - `[abc]` matches any character in the brackets
/// - `[!abc]` matches any character not in the brackets
///
/// # Example
///
/// ```
/// use pf_discoverer::filter::PatternFilter;
/// use pf_discoverer::s3::S3Object;
///
/// let filter = PatternFilter::new("*.parquet").unwrap();
///
/// let parquet = S3Object { key: "data/file.parquet".to_string(), size: 100, last_modified: None };
/// let json = S3Object { key: "data/file.json".to_string(), size: 100, last_modified: None };
///
/// assert!(filter.matches_key("data/file.parquet"));
/// assert!(!filter.matches_key("file.json"));
/// ```
#[derive(Debug, Clone)]
pub struct PatternFilter {
    pattern: String,
    compiled: Pattern,
    match_full_path: bool,
}

impl PatternFilter {
    /// Create a new pattern filter.
    ///
    /// # Arguments
    ///
    /// * `pattern` - A glob pattern to match against filenames
    ///
    /// # Returns
    ///
    /// Returns an error if the pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern)
            .map_err(|e| PfError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            compiled,
            match_full_path: false,
        })
    }

    /// Set whether to match against the full path or just the filename.
    ///
    /// By default, matches against the filename only (basename).
    pub fn with_match_full_path(mut self, match_full_path: bool) -> Self {
        self.match_full_path = match_full_path;
        self
    }

    /// Check if a key matches the pattern.
    ///
    /// Matches against the filename (basename) of the key by default,
    /// or the full path if `match_full_path` is enabled.
    pub fn matches_key(&self, key: &str) -> bool {
        let target = if self.match_full_path {
            key
        } else {
            // Extract filename from key (after last /)
            key.rsplit('/').next().unwrap_or(key)
        };
        self.compiled.matches(target)
    }

    /// Check if a key matches the pattern (case-insensitive).
    pub fn matches_case_insensitive(&self, key: &str) -> bool {
        let target = if self.match_full_path {
            key.to_lowercase()
        } else {
            let filename = key.rsplit('/').next().unwrap_or(key);
            filename.to_lowercase()
        };
        self.compiled.matches(&target)
    }

    /// Get the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Filter for PatternFilter {
    fn matches(&self, obj: &S3Object) -> bool {
        self.matches_key(&obj.key)
    }

    fn description(&self) -> String {
        if self.match_full_path {
            format!("pattern(full_path='{}')", self.pattern)
        } else {
            format!("pattern('{}')", self.pattern)
        }
    }
}

/// A filter that matches files against multiple patterns with OR logic.
///
/// A file passes the filter if it matches ANY of the configured patterns.
/// This is useful when you want to discover files matching multiple extensions
/// or naming conventions.
///
/// # Example
///
/// ```
/// use pf_discoverer::filter::MultiPatternFilter;
///
/// // Match parquet OR ndjson files
/// let filter = MultiPatternFilter::new(&["*.parquet", "*.ndjson"]).unwrap();
///
/// assert!(filter.matches_key("data.parquet"));
/// assert!(filter.matches_key("logs.ndjson"));
/// assert!(!filter.matches_key("config.json"));
/// ```
#[derive(Debug, Clone)]
pub struct MultiPatternFilter {
    patterns: Vec<PatternFilter>,
    match_full_path: bool,
}

impl MultiPatternFilter {
    /// Create a new multi-pattern filter.
    ///
    /// # Arguments
    ///
    /// * `patterns` - A slice of glob patterns. A file matches if it matches ANY pattern.
    ///
    /// # Returns
    ///
    /// Returns an error if any pattern is invalid.
    pub fn new(patterns: &[&str]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            compiled.push(PatternFilter::new(pattern)?);
        }

        Ok(Self {
            patterns: compiled,
            match_full_path: false,
        })
    }

    /// Set whether to match against the full path or just the filename.
    pub fn with_match_full_path(mut self, match_full_path: bool) -> Self {
        self.match_full_path = match_full_path;
        for pattern in &mut self.patterns {
            pattern.match_full_path = match_full_path;
        }
        self
    }

    /// Check if a key matches any of the patterns.
    pub fn matches_key(&self, key: &str) -> bool {
        // Empty patterns matches everything
        if self.patterns.is_empty() {
            return true;
        }
        self.patterns.iter().any(|p| p.matches_key(key))
    }

    /// Get the pattern strings.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.pattern()).collect()
    }
}

impl Filter for MultiPatternFilter {
    fn matches(&self, obj: &S3Object) -> bool {
        self.matches_key(&obj.key)
    }

    fn description(&self) -> String {
        let patterns: Vec<&str> = self.patterns.iter().map(|p| p.pattern()).collect();
        format!("patterns({:?})", patterns)
    }
}

/// A filter that matches all files (no filtering).
#[derive(Debug, Clone, Default)]
pub struct MatchAllFilter;

impl MatchAllFilter {
    /// Create a new match-all filter.
    pub fn new() -> Self {
        Self
    }
}

impl Filter for MatchAllFilter {
    fn matches(&self, _obj: &S3Object) -> bool {
        true
    }

    fn description(&self) -> String {
        "match_all".to_string()
    }
}
