//! Size-based filtering for file discovery.
//!
//! Provides filtering of S3 objects based on file size ranges.

use super::Filter;
use crate::s3::S3Object;

/// A filter for matching files based on size constraints.
///
/// Can filter by minimum size, maximum size, or both. A file passes the filter
/// if its size falls within the specified range (inclusive).
///
/// # Example
///
/// ```
/// use pf_discoverer::filter::SizeFilter;
/// use pf_discoverer::s3::S3Object;
///
/// // Only files larger than 1KB
/// let min_filter = SizeFilter::new().with_min_size(1024);
///
/// // Only files smaller than 1GB
/// let max_filter = SizeFilter::new().with_max_size(1024 * 1024 * 1024);
///
/// // Files between 1KB and 1GB
/// let range_filter = SizeFilter::new()
///     .with_min_size(1024)
///     .with_max_size(1024 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SizeFilter {
    /// Minimum file size in bytes (inclusive)
    min_size: Option<u64>,
    /// Maximum file size in bytes (inclusive)
    max_size: Option<u64>,
}

impl SizeFilter {
    /// Create a new size filter with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum file size in bytes.
    ///
    /// Files smaller than this size will be filtered out.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Set the maximum file size in bytes.
    ///
    /// Files larger than this size will be filtered out.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Check if a file size matches the filter constraints.
    pub fn matches_size(&self, size: u64) -> bool {
        if let Some(min) = self.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Get the minimum size constraint, if set.
    pub fn min_size(&self) -> Option<u64> {
        self.min_size
    }

    /// Get the maximum size constraint, if set.
    pub fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    /// Check if this filter has any constraints.
    pub fn has_constraints(&self) -> bool {
        self.min_size.is_some() || self.max_size.is_some()
    }
}

impl Filter for SizeFilter {
    fn matches(&self, obj: &S3Object) -> bool {
        self.matches_size(obj.size)
    }

    fn description(&self) -> String {
        match (self.min_size, self.max_size) {
            (Some(min), Some(max)) => {
                format!("size(min={}, max={})", format_size(min), format_size(max))
            }
            (Some(min), None) => format!("size(min={})", format_size(min)),
            (None, Some(max)) => format!("size(max={})", format_size(max)),
            (None, None) => "size(any)".to_string(),
        }
    }
}

/// Format a size in bytes as a human-readable string.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}
