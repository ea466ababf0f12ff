//! NDJSON reader implementation.

use crate::s3::{parse_s3_uri, S3Client};
use arrow::datatypes::SchemaRef;
use arrow_json::ReaderBuilder;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use pf_error::{PfError, ReaderError, Result};
use pf_traits::{BatchStream, FileMetadata, StreamingReader};
use pf_types::Batch;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Configuration for the NDJSON reader.
#[derive(Debug, Clone)]
pub struct NdjsonReaderConfig {
    /// AWS region for S3 access
    pub region: String,

    /// Optional S3 endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// Batch size for reading (number of rows per batch)
    pub batch_size: usize,

    /// Maximum number of records to infer schema from
    pub schema_infer_max_records: usize,
}

impl NdjsonReaderConfig {
    /// Create a new configuration with default batch size.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            batch_size: 8192,
            schema_infer_max_records: 1000,
        }
    }

    /// Set the S3 endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the maximum records for schema inference.
    pub fn with_schema_infer_max_records(mut self, max: usize) -> Self {
        self.schema_infer_max_records = max;
        self
    }
}

/// Streaming NDJSON file reader.
///
/// Supports reading from both local files and S3 URIs.
pub struct NdjsonReader {
    config: NdjsonReaderConfig,
    s3_client: Option<S3Client>,
}

impl NdjsonReader {
    /// Create a new NDJSON reader with the given configuration.
    pub async fn new(config: NdjsonReaderConfig) -> Result<Self> {
        let s3_client = S3Client::new(&config.region, config.endpoint.as_deref()).await?;

        Ok(Self {
            config,
            s3_client: Some(s3_client),
        })
    }

    /// Create an NDJSON reader for local files only (no S3 support).
    pub fn local_only() -> Self {
        Self {
            config: NdjsonReaderConfig::new("local"),
            s3_client: None,
        }
    }

    /// Read file data from the given URI.
    async fn read_file_data(&self, uri: &str) -> Result<Bytes> {
        if uri.starts_with("s3://") {
            let s3_client = self.s3_client.as_ref().ok_or_else(|| {
                PfError::Reader(ReaderError::S3Error(
                    "S3 client not configured for S3 URIs".to_string(),
                ))
            })?;

            let (bucket, key) = parse_s3_uri(uri)?;
            s3_client.get_object(&bucket, &key).await
        } else if uri.starts_with("file://") {
            let path = uri.strip_prefix("file://").unwrap();
            self.read_local_file(path)
        } else {
            // Assume local file path
            self.read_local_file(uri)
        }
    }

    /// Read a local file into memory.
    fn read_local_file(&self, path: &str) -> Result<Bytes> {
        debug!(path = path, "Reading local NDJSON file");

        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PfError::Reader(ReaderError::NotFound(path.to_string()))
            } else {
                PfError::Reader(ReaderError::Io(format!(
                    "Failed to open file '{}': {}",
                    path, e
                )))
            }
        })?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).map_err(|e| {
            PfError::Reader(ReaderError::Io(format!(
                "Failed to read file '{}': {}",
                path, e
            )))
        })?;

        Ok(Bytes::from(buffer))
    }

    /// Get the size of a file.
    async fn get_file_size(&self, uri: &str) -> Result<u64> {
        if uri.starts_with("s3://") {
            let s3_client = self.s3_client.as_ref().ok_or_else(|| {
                PfError::Reader(ReaderError::S3Error(
                    "S3 client not configured for S3 URIs".to_string(),
                ))
            })?;

            let (bucket, key) = parse_s3_uri(uri)?;
            s3_client.get_object_size(&bucket, &key).await
        } else {
            let path = if uri.starts_with("file://") {
                uri.strip_prefix("file://").unwrap()
            } else {
                uri
            };

            let metadata = std::fs::metadata(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PfError::Reader(ReaderError::NotFound(path.to_string()))
                } else {
                    PfError::Reader(ReaderError::Io(format!(
                        "Failed to get metadata for '{}': {}",
                        path, e
                    )))
                }
            })?;

            Ok(metadata.len())
        }
    }

    /// Infer schema from NDJSON data.
    fn infer_schema(&self, data: &[u8]) -> Result<SchemaRef> {
        let cursor = std::io::Cursor::new(data);
        let reader = BufReader::new(cursor);

        // Collect up to max_records lines for schema inference
        let lines: Vec<String> = reader
            .lines()
            .take(self.config.schema_infer_max_records)
            .filter_map(|l| l.ok())
            .filter(|l| !l.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Err(PfError::Reader(ReaderError::ParseError(
                "Empty NDJSON file, cannot infer schema".to_string(),
            )));
        }

        // Use arrow-json to infer schema
        let infer_data = lines.join("\n");
        let cursor = std::io::Cursor::new(infer_data.as_bytes());

        let (inferred, _) = arrow_json::reader::infer_json_schema(cursor, None).map_err(|e| {
            PfError::Reader(ReaderError::ParseError(format!(
                "Failed to infer JSON schema: {}",
                e
            )))
        })?;

        Ok(Arc::new(inferred))
    }

    /// Count lines in NDJSON data.
    fn count_lines(&self, data: &[u8]) -> usize {
        data.iter().filter(|&&b| b == b'\n').count()
    }
}

#[async_trait]
impl StreamingReader for NdjsonReader {
    async fn read_stream(&self, uri: &str) -> Result<BatchStream> {
        info!(uri = uri, "Opening NDJSON file for streaming");

        // Download the file data
        let data = self.read_file_data(uri).await?;
        let file_size = data.len();

        debug!(
            uri = uri,
            size = file_size,
            "Downloaded NDJSON file, creating reader"
        );

        // Infer schema from the data
        let schema = self.infer_schema(&data)?;

        debug!(
            uri = uri,
            fields = schema.fields().len(),
            "Inferred schema"
        );

        // Create JSON reader
        let cursor = std::io::Cursor::new(data);
        let reader = ReaderBuilder::new(schema.clone())
            .with_batch_size(self.config.batch_size)
            .build(BufReader::new(cursor))
            .map_err(|e| {
                PfError::Reader(ReaderError::ParseError(format!(
                    "Failed to create JSON reader for '{}': {}",
                    uri, e
                )))
            })?;

        let uri_clone = uri.to_string();

        // Convert to batches
        let batches: Vec<_> = reader
            .enumerate()
            .map(|(batch_index, result)| {
                result
                    .map(|record_batch| {
                        trace!(
                            batch_index = batch_index,
                            rows = record_batch.num_rows(),
                            "Read NDJSON batch"
                        );
                        Batch::new(record_batch, uri_clone.clone(), batch_index)
                    })
                    .map_err(|e| {
                        PfError::Reader(ReaderError::ParseError(format!(
                            "Failed to read batch {}: {}",
                            batch_index, e
                        )))
                    })
            })
            .collect();

        debug!(
            uri = uri,
            batch_count = batches.len(),
            "Created batch stream"
        );

        Ok(Box::pin(stream::iter(batches)))
    }

    async fn file_metadata(&self, uri: &str) -> Result<FileMetadata> {
        debug!(uri = uri, "Getting NDJSON file metadata");

        let size = self.get_file_size(uri).await?;
        let data = self.read_file_data(uri).await?;

        let schema = self.infer_schema(&data)?;
        let row_count = self.count_lines(&data);

        Ok(FileMetadata::new(size, schema).with_row_count(row_count as u64))
    }
}
