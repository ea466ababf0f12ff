//! Main execution logic for pf-worker CLI.

use anyhow::Result;
use pf_worker::{
    StatsDestination, StdoutDestination, WorkerConfig, Worker, StdinSource, SqsSource, SqsSourceConfig,
    destination::OutputFormat,
};
use pf_traits::BatchIndexer;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::args::{Cli, DestinationType, InputType, LogLevel};

/// Initialize logging.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    let subscriber = fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr); // Log to stderr so stdout is clean for output

    subscriber.init();

    Ok(())
}

/// Execute the worker with the provided arguments.
pub async fn execute(args: Cli) -> Result<pf_worker::stats::StatsSnapshot> {
    // Build worker configuration
    let config = WorkerConfig::new()
        .with_thread_count(args.threads)
        .with_batch_size(args.batch_size)
        .with_max_retries(args.max_retries)
        .with_channel_buffer(args.channel_buffer)
        .with_region(&args.region);

    let config = if let Some(ref endpoint) = args.s3_endpoint {
        config.with_s3_endpoint(endpoint)
    } else {
        config
    };

    // Validate configuration
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create destination
    let destination: Arc<dyn BatchIndexer> = match args.destination {
        DestinationType::Stdout => {
            let format: OutputFormat = args.output_format.into();
            Arc::new(StdoutDestination::new(format))
        }
        DestinationType::Stats => Arc::new(StatsDestination::new()),
    };

    // Create reader (placeholder - needs actual implementation)
    let reader = PlaceholderReader::new(&args.region, args.s3_endpoint.as_deref()).await?;

    // Execute based on input type
    let stats = match args.input {
        InputType::Stdin => {
            let source = StdinSource::new();
            let worker = Worker::new(config, source, reader, destination);
            worker.run().await?
        }
        InputType::Sqs => {
            let queue_url = args
                .sqs_queue_url
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--sqs-queue-url is required when input=sqs"))?;

            let sqs_config = SqsSourceConfig::new(queue_url)
                .with_visibility_timeout(args.sqs_visibility_timeout);

            let source = if let Some(ref endpoint) = args.sqs_endpoint {
                SqsSource::from_config_with_endpoint(sqs_config, endpoint, &args.region).await?
            } else {
                SqsSource::from_config(sqs_config).await?
            };

            let worker = Worker::new(config, source, reader, destination);
            worker.run().await?
        }
    };

    Ok(stats)
}

/// Placeholder reader implementation.
///
/// This is a temporary implementation until pf-reader-parquet and pf-reader-ndjson
/// are fully implemented.
pub struct PlaceholderReader {
    region: String,
    endpoint: Option<String>,
}

impl PlaceholderReader {
    pub async fn new(region: &str, endpoint: Option<&str>) -> Result<Self> {
        Ok(Self {
            region: region.to_string(),
            endpoint: endpoint.map(String::from),
        })
    }
}

use async_trait::async_trait;
use pf_error::{PfError, ReaderError};
use arrow::datatypes::{DataType, Field, Schema};
use pf_traits::{BatchStream, FileMetadata, StreamingReader};

#[async_trait]
impl StreamingReader for PlaceholderReader {
    async fn read_stream(&self, uri: &str) -> pf_error::Result<BatchStream> {
        // Placeholder - return an error indicating not implemented
        // In a real implementation, this would:
        // 1. Parse the URI to determine if S3 or local file
        // 2. Create appropriate reader based on file format
        // 3. Return a stream of batches
        Err(PfError::Reader(ReaderError::NotFound(format!(
            "Reader not yet implemented for: {}. Use pf-reader-parquet or pf-reader-ndjson.",
            uri
        ))))
    }

    async fn file_metadata(&self, uri: &str) -> pf_error::Result<FileMetadata> {
        // Placeholder schema
        let schema = Arc::new(Schema::new(vec![
            Field::new("placeholder", DataType::Utf8, true),
        ]));
        Ok(FileMetadata::new(0, schema))
    }
}
