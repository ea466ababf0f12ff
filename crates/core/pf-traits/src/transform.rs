//! Transform trait for record processing.

use arrow::record_batch::RecordBatch;
use pf_error::Result;
use std::sync::Arc;

/// Trait for record transformations.
///
/// Transforms operate on Arrow RecordBatches, enabling:
/// - Filtering (dropping rows)
/// - Field manipulation (adding, modifying, removing columns)
/// - Enrichment (adding data from lookup tables)
///
/// # Zero-Copy Semantics
///
/// Implementations should strive for zero-copy where possible:
/// - Column projection: Share underlying buffers
/// - Row filtering: Use Arrow's filter kernel
/// - Column addition: Only allocate new column
///
/// # Thread Safety
///
/// Transforms must be `Send + Sync` as they may be used across threads.
/// Internal state (like Rhai engines) should use appropriate synchronization.
pub trait Transform: Send + Sync {
    /// Applies the transform to a batch.
    ///
    /// # Arguments
    ///
    /// * `batch` - Input batch to transform
    ///
    /// # Returns
    ///
    /// Transformed batch (may have different row count or columns)
    fn apply(&self, batch: Arc<RecordBatch>) -> Result<Arc<RecordBatch>>;

    /// Returns the name of this transform for logging.
    fn name(&self) -> &str {
        "transform"
    }
}

/// A chain of transforms applied in sequence.
pub struct TransformChain {
    transforms: Vec<Box<dyn Transform>>,
    name: String,
}

impl TransformChain {
    /// Creates a new empty transform chain.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
            name: "chain".to_string(),
        }
    }

    /// Adds a transform to the chain.
    pub fn push(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Sets the name of this chain.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns true if the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Returns the number of transforms in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }
}

impl Default for TransformChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for TransformChain {
    fn apply(&self, mut batch: Arc<RecordBatch>) -> Result<Arc<RecordBatch>> {
        for transform in &self.transforms {
            batch = transform.apply(batch)?;
        }
        Ok(batch)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An identity transform that passes batches through unchanged.
///
/// Useful as a default or placeholder.
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn apply(&self, batch: Arc<RecordBatch>) -> Result<Arc<RecordBatch>> {
        Ok(batch)
    }

    fn name(&self) -> &str {
        "identity"
    }
}
