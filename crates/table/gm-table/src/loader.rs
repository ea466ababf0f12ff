//! Loaders turning delimited files into in-memory tables.

use crate::{CodeTable, CodeTableConfig, GdpTable, GdpTableConfig, TableRow};
use gm_error::{GmError, Result, TableError};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loads the code-translation table.
///
/// Both configured columns are key columns: their values are trimmed of
/// surrounding whitespace. All pairs are kept in file order.
pub fn load_code_table(config: &CodeTableConfig) -> Result<CodeTable> {
    let mut reader = open_reader(&config.path, config.delimiter, config.quote)?;
    let header = read_header(&mut reader)?;

    let plot_idx = column_position(&header, &config.plot_column)?;
    let data_idx = column_position(&header, &config.data_column)?;

    let mut table = CodeTable::new();
    for result in reader.records() {
        let record = result.map_err(|e| TableError::Parse(e.to_string()))?;
        let plot_code = record.get(plot_idx).unwrap_or("").trim();
        let data_code = record.get(data_idx).unwrap_or("").trim();
        table.push(plot_code, data_code);
    }

    info!(
        source = %config.path,
        plot_column = %config.plot_column,
        data_column = %config.data_column,
        entries = table.len(),
        "Loaded code table"
    );

    Ok(table)
}

/// Loads the GDP table.
///
/// The code key is trimmed and upper-cased before indexing; all other
/// columns keep their raw content, year cells included. An exact-duplicate
/// key replaces the stored record.
pub fn load_gdp_table(config: &GdpTableConfig) -> Result<GdpTable> {
    let mut reader = open_reader(&config.path, config.delimiter, config.quote)?;
    let header = read_header(&mut reader)?;

    let code_idx = column_position(&header, &config.code_column)?;
    // The name column is part of the loader contract even though the key is
    // what drives the join; a dataset without it is misconfigured.
    column_position(&header, &config.name_column)?;

    let header = Arc::new(header);
    let mut table = GdpTable::new();
    for result in reader.records() {
        let record = result.map_err(|e| TableError::Parse(e.to_string()))?;
        let code = record.get(code_idx).unwrap_or("").trim().to_uppercase();
        let values: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        table.insert(code, TableRow::new(values, Arc::clone(&header)));
    }

    info!(
        source = %config.path,
        code_column = %config.code_column,
        entries = table.len(),
        "Loaded GDP table"
    );

    Ok(table)
}

fn open_reader(path: &str, delimiter: char, quote: char) -> Result<csv::Reader<std::fs::File>> {
    let delimiter = ascii_byte(delimiter, "delimiter")?;
    let quote = ascii_byte(quote, "quote character")?;

    if !Path::new(path).exists() {
        return Err(TableError::NotFound(path.to_string()).into());
    }

    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .from_path(path)
        .map_err(|e| TableError::Io(format!("Failed to open {path}: {e}")).into())
}

fn read_header(reader: &mut csv::Reader<std::fs::File>) -> Result<Vec<String>> {
    let header = reader
        .headers()
        .map_err(|e| TableError::Parse(format!("Failed to parse header row: {e}")))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    Ok(header)
}

fn column_position(header: &[String], column: &str) -> Result<usize> {
    header.iter().position(|h| h == column).ok_or_else(|| {
        TableError::MissingColumn {
            column: column.to_string(),
            header: header.to_vec(),
        }
        .into()
    })
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    u8::try_from(c).map_err(|_| GmError::Config(format!("{what} '{c}' is not a single byte")))
}
