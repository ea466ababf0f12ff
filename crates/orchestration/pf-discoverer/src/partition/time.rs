//! Time-based prefix generation for partitioned data.
//!
//! Provides functionality to expand partitioning expressions with time format
//! specifiers into concrete S3 prefixes based on date ranges.

use chrono::NaiveDate;
use pf_error::{PfError, Result};
use std::collections::{HashMap, HashSet};

use super::expression::{PartitioningExpression, PathSegment};
use super::filter::PartitionFilters;

/// Generate all S3 prefixes by expanding date range and variable combinations.
///
/// This function handles the expansion of partitioning expressions that contain
/// both regular variables and time format specifiers. It generates the cartesian
/// product of all date values and variable values, then deduplicates the resulting
/// prefixes.
///
/// # Arguments
///
/// * `expr` - The partitioning expression to expand
/// * `filters` - The partition filters including time range and variable values
///
/// # Returns
///
/// A vector of unique S3 prefixes to scan.
///
/// # Errors
///
/// Returns an error if:
/// - The expression uses time formats but no time filter is provided
/// - A required variable has no filter values
///
/// # Example
///
/// ```
/// use pf_discoverer::partition::{PartitioningExpression, PartitionFilters, expand_all_prefixes};
///
/// let expr = PartitioningExpression::parse(
///     "data/YEAR=${_time:%Y}/MONTH=${_time:%m}/${element}/"
/// ).unwrap();
///
/// let mut filters = PartitionFilters::new();
/// filters.parse_and_add("_time=2022-01-01..2022-01-02").unwrap();
/// filters.add_filter("element", &["cpu"]);
///
/// let prefixes = expand_all_prefixes(&expr, &filters).unwrap();
/// // Result: ["data/YEAR=2022/MONTH=01/cpu/"]
/// // (deduplicated since both dates are in the same month)
/// ```
pub fn expand_all_prefixes(
    expr: &PartitioningExpression,
    filters: &PartitionFilters,
) -> Result<Vec<String>> {
    // Check if expression uses time formats
    if expr.has_time_formats() && filters.time_filter().is_none() {
        return Err(PfError::Config(
            "Partitioning expression uses ${_time:...} but no time filter provided. \
             Use --filter \"_time=YYYY-MM-DD..YYYY-MM-DD\" to specify date range"
                .to_string(),
        ));
    }

    // Get dates from time filter (or empty vec if no time formats)
    let dates: Vec<Option<NaiveDate>> = if expr.has_time_formats() {
        filters
            .time_filter()
            .map(|tf| tf.dates().map(Some).collect())
            .unwrap_or_else(|| vec![None])
    } else {
        vec![None]
    };

    // Get variable combinations
    let var_combos = generate_variable_combinations(expr, filters)?;

    // Generate all prefix combinations
    let mut all_prefixes = HashSet::new();

    for date in &dates {
        for combo in &var_combos {
            let prefix = build_prefix(expr, combo, *date)?;
            all_prefixes.insert(prefix);
        }
    }

    // Sort for deterministic output
    let mut result: Vec<String> = all_prefixes.into_iter().collect();
    result.sort();

    Ok(result)
}

/// Generate all combinations of variable values.
///
/// Returns a vector of hashmaps, where each hashmap represents one combination
/// of variable values. If no variables exist, returns a vec with one empty map.
fn generate_variable_combinations(
    expr: &PartitioningExpression,
    filters: &PartitionFilters,
) -> Result<Vec<HashMap<String, String>>> {
    let variables = expr.variables();

    if variables.is_empty() {
        // No variables, return single empty combination
        return Ok(vec![HashMap::new()]);
    }

    // Check that all variables have filters
    for var in &variables {
        if !filters.has_filter(var) {
            return Err(PfError::Config(format!(
                "Variable '{}' in partitioning expression has no filter. \
                 Use --partition-filter \"{}=value1,value2\" to specify values",
                var, var
            )));
        }
    }

    // Build cartesian product of all variable values
    let mut combinations = vec![HashMap::new()];

    for var in variables {
        let values = filters
            .get_values(var)
            .expect("checked above that filter exists");

        let mut new_combinations = Vec::new();
        for combo in combinations {
            for value in &values {
                let mut new_combo = combo.clone();
                new_combo.insert(var.to_string(), value.to_string());
                new_combinations.push(new_combo);
            }
        }
        combinations = new_combinations;
    }

    Ok(combinations)
}

/// Build a prefix string from an expression and variable/date values.
fn build_prefix(
    expr: &PartitioningExpression,
    vars: &HashMap<String, String>,
    date: Option<NaiveDate>,
) -> Result<String> {
    let mut prefix = String::new();
    let mut need_separator = false;

    for segment in expr.segments() {
        match segment {
            PathSegment::Static(text) => {
                // Add separator if needed before this static segment
                // (unless it starts with '=' which means it's a continuation)
                if need_separator && !text.starts_with('=') {
                    prefix.push('/');
                }
                prefix.push_str(text);
                // After a static segment, we need a separator unless it ends with '='
                need_separator = !text.ends_with('=');
            }
            PathSegment::Variable(name) => {
                // Variables are always preceded by a separator (they're full path components)
                if need_separator {
                    prefix.push('/');
                }
                if let Some(value) = vars.get(name) {
                    prefix.push_str(value);
                } else {
                    return Err(PfError::Config(format!(
                        "Missing value for variable '{}' during prefix generation",
                        name
                    )));
                }
                need_separator = true;
            }
            PathSegment::TimeFormat(spec) => {
                // Time formats are continuations (no separator before them)
                // They follow static segments like "YEAR="
                if let Some(d) = date {
                    prefix.push_str(&spec.format_date(&d));
                } else {
                    return Err(PfError::Config(
                        "Time format segment found but no date provided".to_string(),
                    ));
                }
                // After a time format, we need a separator for the next segment
                need_separator = true;
            }
        }
    }

    // Add trailing slash if the expression had one
    if expr.has_trailing_slash() && !prefix.ends_with('/') {
        prefix.push('/');
    }

    Ok(prefix)
}
