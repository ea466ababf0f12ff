//! Map layer assembly for gdpmap.
//!
//! This crate sits at the boundary with the chart-rendering collaborator:
//! - [`MapLayers`] - the three shapes a world-map renderer accepts: a
//!   code→value layer and two categorical code-set layers
//! - [`MapSink`] - the output seam, with [`JsonSink`] writing layers as
//!   pretty JSON or JSONL to stdout or a file
//! - [`world`] - the built-in universe of two-letter plot codes
//! - [`build_map_layers`] - the end-to-end pipeline: load both tables,
//!   reconcile, extract one year, package the layers
//!
//! Drawing the actual chart (projection, colors, output artifact) is the
//! renderer's concern, not this crate's.

mod layers;
mod pipeline;
mod sink;
pub mod world;

pub use gm_reconcile::PlotCountries;
pub use layers::{MapLayers, NO_DATA_LAYER, NO_MATCH_LAYER, VALUE_LAYER};
pub use pipeline::build_map_layers;
pub use sink::{JsonSink, MapSink, OutputFormat};
