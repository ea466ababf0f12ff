//! Delimited-table loading for gdpmap.
//!
//! This crate reads the two input datasets into in-memory tables:
//! - [`CodeTable`] - ordered (plot code, data code) pairs from the
//!   translation file
//! - [`GdpTable`] - country records keyed by upper-cased country code, one
//!   column per year
//! - [`TableRow`] - a single record with values addressable by column name
//!
//! Loading is synchronous: each file is opened, fully consumed and closed
//! before the caller moves on. Missing files, missing columns and malformed
//! delimited content are fatal [`gm_error::TableError`]s; nothing is
//! recovered or skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use gm_table::{load_gdp_table, GdpTableConfig};
//!
//! let config = GdpTableConfig::new("isp_gdp.csv");
//! let gdp = load_gdp_table(&config)?;
//! let norway = gdp.get("NOR").unwrap();
//! assert_eq!(norway.get("Country Name"), Some("Norway"));
//! ```

mod code_table;
mod config;
mod gdp_table;
mod loader;
mod row;

pub use code_table::CodeTable;
pub use config::{CodeTableConfig, GdpTableConfig};
pub use gdp_table::GdpTable;
pub use loader::{load_code_table, load_gdp_table};
pub use row::TableRow;
