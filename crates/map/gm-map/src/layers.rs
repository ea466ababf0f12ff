//! MapLayers - the shapes handed to the chart renderer.

use gm_reconcile::YearExtraction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the color-scaled value layer.
pub const VALUE_LAYER: &str = "GDP (log10)";

/// Name of the categorical layer for codes absent from the GDP dataset.
pub const NO_MATCH_LAYER: &str = "No match in GDP file";

/// Name of the categorical layer for codes without a value for the year.
pub const NO_DATA_LAYER: &str = "No GDP for year";

/// One year's worth of choropleth input.
///
/// Collections are ordered so serialized output is deterministic; which
/// layer a code lands in is decided upstream and never changes here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayers {
    /// Chart title.
    pub title: String,

    /// Plot code → log10(GDP) for the color-scaled layer.
    pub values: BTreeMap<String, f64>,

    /// Plot codes with no corresponding GDP record.
    pub no_match: BTreeSet<String>,

    /// Plot codes lacking a usable value for the requested year.
    pub no_data: BTreeSet<String>,
}

impl MapLayers {
    /// Packages a year extraction into renderer layers.
    pub fn from_extraction(year: &str, extraction: YearExtraction) -> Self {
        Self {
            title: format!("GDP by Country in {year} (log scale)"),
            values: extraction.values.into_iter().collect(),
            no_match: extraction.no_match.into_iter().collect(),
            no_data: extraction.no_data.into_iter().collect(),
        }
    }

    /// Returns the number of codes in the value layer.
    pub fn plotted(&self) -> usize {
        self.values.len()
    }
}
