//! MapSink - the output seam toward the chart renderer.

use crate::layers::{MapLayers, NO_DATA_LAYER, NO_MATCH_LAYER, VALUE_LAYER};
use gm_error::{GmError, Result};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;

/// Output format for serialized layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per layer)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

/// A consumer of assembled map layers.
///
/// Implementations decide what a "render" means - writing chart input to a
/// file, feeding an in-process charting library, posting to a service.
pub trait MapSink {
    /// Writes one year's layers.
    fn write(&self, layers: &MapLayers) -> Result<()>;

    /// Returns the name of this sink for logging.
    fn name(&self) -> &str {
        "sink"
    }
}

/// Sink that serializes layers as JSON to stdout or a file.
pub struct JsonSink {
    format: OutputFormat,
    target: Target,
}

enum Target {
    Stdout,
    File(PathBuf),
}

impl JsonSink {
    /// Creates a sink writing to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            format,
            target: Target::Stdout,
        }
    }

    /// Creates a sink writing to `path`.
    pub fn file(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            format,
            target: Target::File(path.into()),
        }
    }

    fn payload(&self, layers: &MapLayers) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(layers)
                .map_err(|e| GmError::Render(format!("Failed to serialize layers: {e}"))),
            OutputFormat::Jsonl => {
                let lines = [
                    json!({ "layer": VALUE_LAYER, "data": layers.values }),
                    json!({ "layer": NO_MATCH_LAYER, "codes": layers.no_match }),
                    json!({ "layer": NO_DATA_LAYER, "codes": layers.no_data }),
                ];
                let mut out = String::new();
                for line in &lines {
                    let rendered = serde_json::to_string(line).map_err(|e| {
                        GmError::Render(format!("Failed to serialize layer: {e}"))
                    })?;
                    out.push_str(&rendered);
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

impl MapSink for JsonSink {
    fn write(&self, layers: &MapLayers) -> Result<()> {
        let payload = self.payload(layers)?;

        match &self.target {
            Target::Stdout => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                write!(handle, "{payload}")
                    .and_then(|_| {
                        if self.format == OutputFormat::Json {
                            writeln!(handle)
                        } else {
                            Ok(())
                        }
                    })
                    .map_err(|e| GmError::Render(format!("Failed to write to stdout: {e}")))
            }
            Target::File(path) => std::fs::write(path, payload).map_err(|e| {
                GmError::Render(format!("Failed to write {}: {e}", path.display()))
            }),
        }
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn layers() -> MapLayers {
        let mut values = BTreeMap::new();
        values.insert("no".to_string(), 11.2);
        values.insert("us".to_string(), 13.0);

        let mut no_match = BTreeSet::new();
        no_match.insert("pr".to_string());

        MapLayers {
            title: "GDP by Country in 2000 (log scale)".to_string(),
            values,
            no_match,
            no_data: BTreeSet::new(),
        }
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdp_map_2000.json");

        let sink = JsonSink::file(&path, OutputFormat::Json);
        sink.write(&layers()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["title"], "GDP by Country in 2000 (log scale)");
        assert_eq!(parsed["values"]["no"], 11.2);
        assert_eq!(parsed["no_match"][0], "pr");
    }

    #[test]
    fn test_jsonl_writes_one_line_per_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdp_map_2000.jsonl");

        let sink = JsonSink::file(&path, OutputFormat::Jsonl);
        sink.write(&layers()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);

        let value_layer: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value_layer["layer"], VALUE_LAYER);
        assert_eq!(value_layer["data"]["us"], 13.0);

        let no_match_layer: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(no_match_layer["layer"], NO_MATCH_LAYER);
        assert_eq!(no_match_layer["codes"][0], "pr");
    }

    #[test]
    fn test_unwritable_path_is_render_error() {
        let sink = JsonSink::file("/nonexistent/dir/out.json", OutputFormat::Json);
        let err = sink.write(&layers()).unwrap_err();
        assert!(err.to_string().contains("Render error"));
    }

    #[test]
    fn test_sink_name() {
        let sink = JsonSink::stdout(OutputFormat::Jsonl);
        assert_eq!(sink.name(), "json");
    }
}
