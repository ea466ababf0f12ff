//! Stats destination implementation.

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use pf_error::Result;
use pf_traits::{BatchIndexer, IndexResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Destination that counts records and tracks metrics without outputting data.
///
/// Used for performance testing and throughput measurement.
///
/// In fast mode (default), skips expensive `get_array_memory_size()` calls
/// which can add 5-10% overhead in high-throughput scenarios.
pub struct StatsDestination {
    records: AtomicU64,
    bytes: AtomicU64,
    batches: AtomicU64,
    /// When true, skip expensive byte size calculations in the hot path.
    /// This improves throughput by 5-10% but bytes will always be 0.
    fast_mode: bool,
}

impl StatsDestination {
    /// Create a new stats destination in fast mode (default).
    ///
    /// Fast mode skips byte size calculations for better throughput.
    pub fn new() -> Self {
        Self {
            records: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            fast_mode: true,
        }
    }

    /// Create a stats destination that tracks byte sizes.
    ///
    /// This is slower than fast mode due to `get_array_memory_size()` calls
    /// on each batch, but provides accurate byte metrics.
    pub fn with_byte_tracking() -> Self {
        Self {
            records: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            fast_mode: false,
        }
    }

    /// Get the current statistics.
    pub fn get_stats(&self) -> StatsReport {
        StatsReport {
            records: self.records.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.records.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
    }
}

impl Default for StatsDestination {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics report from the stats destination.
#[derive(Debug, Clone, Copy)]
pub struct StatsReport {
    /// Total records processed
    pub records: u64,
    /// Total bytes processed (Arrow memory size)
    pub bytes: u64,
    /// Total batches processed
    pub batches: u64,
}

#[async_trait]
impl BatchIndexer for StatsDestination {
    async fn index_batches(&self, batches: &[Arc<RecordBatch>]) -> Result<IndexResult> {
        let start = Instant::now();
        let mut count = 0u64;
        let mut bytes = 0u64;

        if self.fast_mode {
            // Fast path: only count rows, skip expensive byte size calculation
            for batch in batches {
                count += batch.num_rows() as u64;
            }
        } else {
            // Full tracking: count both rows and bytes (slower)
            for batch in batches {
                count += batch.num_rows() as u64;
                bytes += batch.get_array_memory_size() as u64;
            }
            self.bytes.fetch_add(bytes, Ordering::Relaxed);
        }

        self.records.fetch_add(count, Ordering::Relaxed);
        self.batches
            .fetch_add(batches.len() as u64, Ordering::Relaxed);

        Ok(IndexResult::success(count, bytes, start.elapsed()))
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
