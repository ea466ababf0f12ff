//! Country-code reconciliation for gdpmap.
//!
//! This crate implements the core join: resolving a plotting library's
//! country codes to the GDP dataset's keys through a translation table, and
//! extracting a log-scaled GDP value per resolved country for one year.
//!
//! - [`reconcile`] - three-way case-insensitive join; every input plot code
//!   ends up either `matched` or `unmatched`, never both, never neither
//! - [`extract_year`] - per-year value extraction classifying each matched
//!   code as a plottable value or as no-data
//!
//! Both operations are infallible: a code without a counterpart is a normal
//! data condition reported through the result sets, not an error.

mod extract;
mod reconcile;

pub use extract::{extract_year, YearExtraction};
pub use reconcile::{reconcile, Reconciliation};

/// The universe of plot codes, mapped to display names.
///
/// Supplied by the rendering collaborator; this crate treats it as an opaque
/// read-only mapping and never validates its contents.
pub type PlotCountries = std::collections::BTreeMap<String, String>;
