//! Stdin work source implementation.

use super::{WorkAck, WorkMessage, WorkNack, WorkSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pf_error::{PfError, QueueError, Result};
use pf_types::{DestinationConfig, FileFormat, WorkItem};
use serde::Deserialize;
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// A discovered file from pf-discoverer.
///
/// This is the simpler format output by `pf-discoverer` that can be
/// piped directly to `pf-worker`.
#[derive(Debug, Clone, Deserialize)]
struct DiscoveredFile {
    /// The S3 URI of the file (e.g., "s3://bucket/path/file.parquet")
    uri: String,

    /// Size of the file in bytes
    size_bytes: u64,

    /// Last modified timestamp (if available)
    #[serde(default)]
    last_modified: Option<DateTime<Utc>>,
}

impl DiscoveredFile {
    /// Convert to a WorkItem with default configuration.
    ///
    /// Uses format detection based on file extension and placeholder
    /// destination configuration.
    fn into_work_item(self) -> WorkItem {
        // Detect format from file extension
        let format = guess_format_from_uri(&self.uri);

        WorkItem {
            job_id: "stdin".to_string(),
            file_uri: self.uri,
            file_size_bytes: self.size_bytes,
            format,
            destination: DestinationConfig {
                endpoint: "".to_string(),
                index: "".to_string(),
                credentials: None,
            },
            transform: None,
            attempt: 0,
            enqueued_at: self.last_modified.unwrap_or_else(Utc::now),
        }
    }
}

/// Guess file format from URI extension.
fn guess_format_from_uri(uri: &str) -> FileFormat {
    let uri_lower = uri.to_lowercase();
    if uri_lower.ends_with(".parquet") || uri_lower.ends_with(".pq") {
        FileFormat::Parquet
    } else if uri_lower.ends_with(".ndjson")
        || uri_lower.ends_with(".jsonl")
        || uri_lower.ends_with(".json")
    {
        FileFormat::NdJson
    } else {
        // Default to Parquet
        FileFormat::Parquet
    }
}

/// Parse a JSON line into a WorkItem.
///
/// Tries to parse as a full WorkItem first, then falls back to
/// DiscoveredFile format (from pf-discoverer).
fn parse_work_item(line: &str) -> Option<WorkItem> {
    // Try full WorkItem format first
    if let Ok(work_item) = serde_json::from_str::<WorkItem>(line) {
        return Some(work_item);
    }

    // Fall back to DiscoveredFile format (pf-discoverer output)
    if let Ok(discovered) = serde_json::from_str::<DiscoveredFile>(line) {
        return Some(discovered.into_work_item());
    }

    None
}

/// Work source that reads JSONL work items from stdin.
///
/// Supports two input formats:
///
/// 1. **Full WorkItem format** (for production use with complete configuration):
///    ```jsonl
///    {"job_id":"job-1","file_uri":"s3://bucket/file.parquet","file_size_bytes":1024,...}
///    ```
///
/// 2. **DiscoveredFile format** (from pf-discoverer, for local testing):
///    ```jsonl
///    {"uri":"s3://bucket/file.parquet","size_bytes":1024,"last_modified":"2024-01-01T00:00:00Z"}
///    ```
///
/// Empty lines are skipped.
pub struct StdinSource {
    /// Reader for stdin (wrapped in Mutex for thread-safe access)
    reader: Mutex<Box<dyn BufRead + Send>>,

    /// Whether we've reached EOF
    eof_reached: AtomicBool,

    /// Counter for generating message IDs
    message_counter: AtomicU64,
}

impl StdinSource {
    /// Create a new stdin source.
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(Box::new(BufReader::new(io::stdin()))),
            eof_reached: AtomicBool::new(false),
            message_counter: AtomicU64::new(0),
        }
    }

    /// Create a stdin source with a custom reader (for testing).
    pub fn with_reader(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            reader: Mutex::new(reader),
            eof_reached: AtomicBool::new(false),
            message_counter: AtomicU64::new(0),
        }
    }

    /// Generate a unique message ID.
    fn next_message_id(&self) -> String {
        let counter = self.message_counter.fetch_add(1, Ordering::Relaxed);
        format!("stdin-{}-{}", Uuid::new_v4(), counter)
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkSource for StdinSource {
    async fn receive(&self, max: usize) -> Result<Option<Vec<WorkMessage>>> {
        if self.eof_reached.load(Ordering::Relaxed) {
            return Ok(None);
        }

        let mut messages = Vec::with_capacity(max);
        let mut reader = self.reader.lock().map_err(|e| {
            PfError::Queue(QueueError::Receive(format!("Failed to lock stdin reader: {}", e)))
        })?;

        for _ in 0..max {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    // EOF reached
                    self.eof_reached.store(true, Ordering::Relaxed);
                    debug!("Stdin EOF reached");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    trace!("Read line from stdin: {}", line);

                    match parse_work_item(line) {
                        Some(work_item) => {
                            messages.push(WorkMessage {
                                id: self.next_message_id(),
                                work_item,
                                receive_count: 1,
                            });
                        }
                        None => {
                            warn!("Failed to parse work item from stdin: {}", line);
                            // Skip invalid lines and continue
                        }
                    }
                }
                Err(e) => {
                    return Err(PfError::Queue(QueueError::Receive(format!(
                        "Failed to read from stdin: {}",
                        e
                    ))));
                }
            }
        }

        if messages.is_empty() && self.eof_reached.load(Ordering::Relaxed) {
            Ok(None)
        } else {
            Ok(Some(messages))
        }
    }

    async fn ack(&self, items: &[WorkAck]) -> Result<()> {
        // No-op for stdin - just log
        for item in items {
            trace!("Ack for stdin message: {}", item.id);
        }
        Ok(())
    }

    async fn nack(&self, items: &[WorkNack]) -> Result<()> {
        // Log failures for stdin
        for item in items {
            warn!(
                "Nack for stdin message {}: {} (dlq={})",
                item.id, item.failure.error_message, item.should_dlq
            );
        }
        Ok(())
    }

    fn has_more(&self) -> bool {
        !self.eof_reached.load(Ordering::Relaxed)
    }
}
