//! S3 utilities for NDJSON reader.

use pf_error::{PfError, ReaderError, Result};

/// Parse an S3 URI into bucket and key.
pub fn parse_s3_uri(uri: &str) -> Result<(String, String)> {
    let url = url::Url::parse(uri).map_err(|e| {
        PfError::Reader(ReaderError::InvalidUri(format!(
            "Invalid S3 URI '{}': {}",
            uri, e
        )))
    })?;

    if url.scheme() != "s3" {
        return Err(PfError::Reader(ReaderError::InvalidUri(format!(
            "Expected s3:// URI, got: {}",
            uri
        ))));
    }

    let bucket = url.host_str().ok_or_else(|| {
        PfError::Reader(ReaderError::InvalidUri(format!(
            "Missing bucket in S3 URI: {}",
            uri
        )))
    })?;

    let key = url.path().trim_start_matches('/');
    if key.is_empty() {
        return Err(PfError::Reader(ReaderError::InvalidUri(format!(
            "Missing key in S3 URI: {}",
            uri
        ))));
    }

    Ok((bucket.to_string(), key.to_string()))
}
