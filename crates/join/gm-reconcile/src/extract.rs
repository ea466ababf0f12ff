//! Per-year GDP value extraction.

use crate::Reconciliation;
use ahash::RandomState;
use gm_table::GdpTable;
use hashbrown::{HashMap, HashSet};
use tracing::debug;

/// Result of extracting one year's values for a reconciled code set.
///
/// The three fields partition the original plot-code set: `values` holds the
/// plottable log-scaled numbers, `no_match` the codes that never resolved to
/// a GDP record, `no_data` the resolved codes without a usable value for the
/// requested year.
#[derive(Debug, Clone)]
pub struct YearExtraction {
    /// Plot code → log10(GDP).
    pub values: HashMap<String, f64, RandomState>,

    /// Plot codes absent from the GDP dataset.
    pub no_match: HashSet<String, RandomState>,

    /// Plot codes present in the dataset but without a usable value for the
    /// requested year.
    pub no_data: HashSet<String, RandomState>,
}

/// Extracts log10(GDP) for `year` from every matched record.
///
/// The year is a column name, not a parsed integer. Each cell is trimmed and
/// parsed as a float; parse failures, absent columns and non-positive values
/// all classify the code as no-data. The reconciliation's `unmatched` set
/// passes through unchanged as `no_match`. Malformed individual values never
/// raise an error.
pub fn extract_year(gdp: &GdpTable, reconciliation: &Reconciliation, year: &str) -> YearExtraction {
    let mut values: HashMap<String, f64, RandomState> = HashMap::with_hasher(RandomState::new());
    let mut no_data: HashSet<String, RandomState> = HashSet::with_hasher(RandomState::new());

    for (plot_code, gdp_code) in &reconciliation.matched {
        let cell = gdp
            .get(gdp_code)
            .and_then(|row| row.get(year))
            .map(str::trim);
        match cell.and_then(|v| v.parse::<f64>().ok()) {
            Some(gdp_value) if gdp_value > 0.0 => {
                values.insert(plot_code.clone(), gdp_value.log10());
            }
            _ => {
                no_data.insert(plot_code.clone());
            }
        }
    }

    debug!(
        year = %year,
        values = values.len(),
        no_match = reconciliation.unmatched.len(),
        no_data = no_data.len(),
        "Extracted year values"
    );

    YearExtraction {
        values,
        no_match: reconciliation.unmatched.clone(),
        no_data,
    }
}
