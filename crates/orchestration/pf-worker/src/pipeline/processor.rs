//! File processing pipeline.

use super::ThreadStats;
use crate::source::WorkMessage;
use crate::stats::WorkerStats;
use arrow::record_batch::RecordBatch;
use futures::StreamExt;
use pf_error::{classify_error, ErrorCategory, PfError, ProcessingStage};
use pf_traits::{BatchIndexer, BatchStream, StreamingReader};
use pf_types::WorkItem;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Processing result for a single file.
#[derive(Debug)]
pub struct ProcessingResult {
    /// Number of records successfully processed
    pub records_processed: u64,

    /// Number of records that failed
    pub records_failed: u64,

    /// Bytes read from the source file
    pub bytes_read: u64,

    /// Bytes written to the destination
    pub bytes_written: u64,

    /// Whether the processing completed successfully
    pub success: bool,

    /// Error if processing failed
    pub error: Option<PfError>,

    /// Error category for retry decisions
    pub error_category: Option<ErrorCategory>,
}

impl ProcessingResult {
    /// Create a successful result.
    pub fn success(records: u64, bytes_read: u64, bytes_written: u64) -> Self {
        Self {
            records_processed: records,
            records_failed: 0,
            bytes_read,
            bytes_written,
            success: true,
            error: None,
            error_category: None,
        }
    }

    /// Create a failed result.
    pub fn failure(error: PfError, stage: ProcessingStage) -> Self {
        let category = classify_error(&error, stage);
        Self {
            records_processed: 0,
            records_failed: 0,
            bytes_read: 0,
            bytes_written: 0,
            success: false,
            error: Some(error),
            error_category: Some(category),
        }
    }

    /// Create a partial success result.
    pub fn partial(
        records_processed: u64,
        records_failed: u64,
        bytes_read: u64,
        bytes_written: u64,
    ) -> Self {
        Self {
            records_processed,
            records_failed,
            bytes_read,
            bytes_written,
            success: records_failed == 0,
            error: None,
            error_category: if records_failed > 0 {
                Some(ErrorCategory::Partial)
            } else {
                None
            },
        }
    }
}

/// Per-thread processing pipeline.
///
/// Each thread has its own pipeline instance that processes files
/// through Reader → Transform → Destination stages.
pub struct Pipeline {
    /// Thread identifier
    thread_id: u32,

    /// Reader for opening and streaming files
    reader: Arc<dyn StreamingReader>,

    /// Destination for writing processed batches
    destination: Arc<dyn BatchIndexer>,

    /// Per-thread statistics
    stats: Arc<ThreadStats>,

    /// Global worker statistics
    global_stats: Arc<WorkerStats>,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(
        thread_id: u32,
        reader: Arc<dyn StreamingReader>,
        destination: Arc<dyn BatchIndexer>,
        global_stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            thread_id,
            reader,
            destination,
            stats: Arc::new(ThreadStats::new(thread_id)),
            global_stats,
        }
    }

    /// Get the thread statistics.
    pub fn stats(&self) -> &Arc<ThreadStats> {
        &self.stats
    }

    /// Process a single work item.
    pub async fn process(&self, message: &WorkMessage) -> ProcessingResult {
        let start = Instant::now();
        let work_item = &message.work_item;

        debug!(
            thread = self.thread_id,
            file = %work_item.file_uri,
            "Processing file"
        );

        // Open the file and get a batch stream
        let stream = match self.reader.read_stream(&work_item.file_uri).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    thread = self.thread_id,
                    file = %work_item.file_uri,
                    error = %e,
                    "Failed to open file"
                );
                self.stats.record_file_failure();
                self.global_stats.record_file_failure();
                return ProcessingResult::failure(e, ProcessingStage::S3Download);
            }
        };

        // Process the batch stream
        let result = self.process_stream(stream, work_item).await;
        let duration = start.elapsed();

        if result.success {
            self.stats.record_file_success(
                result.records_processed,
                result.bytes_read,
                result.bytes_written,
                duration,
            );
            self.global_stats.record_file_success(
                result.records_processed,
                result.bytes_read,
                result.bytes_written,
            );
            info!(
                thread = self.thread_id,
                file = %work_item.file_uri,
                records = result.records_processed,
                duration_ms = duration.as_millis(),
                "File processed successfully"
            );
        } else {
            self.stats.record_file_failure();
            self.global_stats.record_file_failure();
            if let Some(ref error) = result.error {
                warn!(
                    thread = self.thread_id,
                    file = %work_item.file_uri,
                    error = %error,
                    "File processing failed"
                );
            }
        }

        result
    }

    /// Process a batch stream.
    async fn process_stream(
        &self,
        mut stream: BatchStream,
        work_item: &WorkItem,
    ) -> ProcessingResult {
        let mut total_records = 0u64;
        let mut total_bytes_read = 0u64;
        let mut total_bytes_written = 0u64;
        let mut failed_records = 0u64;
        let mut batch_buffer: Vec<Arc<RecordBatch>> = Vec::new();

        while let Some(batch_result) = stream.next().await {
            match batch_result {
                Ok(batch) => {
                    let batch_records = batch.num_rows() as u64;
                    let batch_bytes = batch.metadata().size_bytes as u64;
                    total_bytes_read += batch_bytes;

                    // Get the inner RecordBatch
                    let record_batch = batch.into_arc();
                    batch_buffer.push(record_batch);

                    trace!(
                        thread = self.thread_id,
                        records = batch_records,
                        "Received batch"
                    );

                    // Send batches to destination when buffer is full
                    // For now, send each batch immediately
                    if !batch_buffer.is_empty() {
                        match self.destination.index_batches(&batch_buffer).await {
                            Ok(result) => {
                                total_records += result.success_count;
                                total_bytes_written += result.bytes_sent;
                                failed_records += result.failed_records.len() as u64;

                                self.stats.record_batch(result.success_count, result.bytes_sent);
                                self.global_stats.record_batch();

                                if !result.failed_records.is_empty() {
                                    self.stats.record_failed_records(result.failed_records.len() as u64);
                                    self.global_stats.record_failed_records(result.failed_records.len() as u64);
                                }
                            }
                            Err(e) => {
                                error!(
                                    thread = self.thread_id,
                                    error = %e,
                                    "Failed to index batch"
                                );
                                return ProcessingResult::failure(e, ProcessingStage::EsIndexing);
                            }
                        }
                        batch_buffer.clear();
                    }
                }
                Err(e) => {
                    error!(
                        thread = self.thread_id,
                        error = %e,
                        "Failed to read batch"
                    );
                    // Determine the processing stage based on file format
                    let stage = match work_item.format {
                        pf_types::FileFormat::Parquet => ProcessingStage::ParquetDecode,
                        pf_types::FileFormat::NdJson => ProcessingStage::NdjsonParse,
                    };
                    return ProcessingResult::failure(e, stage);
                }
            }
        }

        // Flush the destination
        if let Err(e) = self.destination.flush().await {
            warn!(
                thread = self.thread_id,
                error = %e,
                "Failed to flush destination"
            );
        }

        if failed_records > 0 {
            ProcessingResult::partial(total_records, failed_records, total_bytes_read, total_bytes_written)
        } else {
            ProcessingResult::success(total_records, total_bytes_read, total_bytes_written)
        }
    }
}
