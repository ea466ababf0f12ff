//! Configuration types for the table loaders.
//!
//! One config struct per loader invocation; there is no global state. The
//! defaults match the World Bank GDP export and the ISO 3166 translation
//! table the program was built around.

use serde::{Deserialize, Serialize};

/// Configuration for loading the code-translation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTableConfig {
    /// Path to the delimited translation file.
    pub path: String,

    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Quote character.
    #[serde(default = "default_quote")]
    pub quote: char,

    /// Column holding the plotting system's code.
    #[serde(default = "default_plot_column")]
    pub plot_column: String,

    /// Column holding the GDP dataset's code.
    #[serde(default = "default_data_column")]
    pub data_column: String,
}

impl CodeTableConfig {
    /// Creates a config for `path` with the ISO 3166 column defaults.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: default_delimiter(),
            quote: default_quote(),
            plot_column: default_plot_column(),
            data_column: default_data_column(),
        }
    }
}

/// Configuration for loading the GDP table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdpTableConfig {
    /// Path to the delimited GDP file.
    pub path: String,

    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Quote character.
    #[serde(default = "default_quote")]
    pub quote: char,

    /// Column holding the country code the table is keyed by.
    #[serde(default = "default_code_column")]
    pub code_column: String,

    /// Column holding the country's display name.
    #[serde(default = "default_name_column")]
    pub name_column: String,
}

impl GdpTableConfig {
    /// Creates a config for `path` with the World Bank column defaults.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: default_delimiter(),
            quote: default_quote(),
            code_column: default_code_column(),
            name_column: default_name_column(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

fn default_plot_column() -> String {
    "ISO3166-1-Alpha-2".to_string()
}

fn default_data_column() -> String {
    "ISO3166-1-Alpha-3".to_string()
}

fn default_code_column() -> String {
    "Country Code".to_string()
}

fn default_name_column() -> String {
    "Country Name".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_config_defaults() {
        let config = CodeTableConfig::new("codes.csv");
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.quote, '"');
        assert_eq!(config.plot_column, "ISO3166-1-Alpha-2");
        assert_eq!(config.data_column, "ISO3166-1-Alpha-3");
    }

    #[test]
    fn test_gdp_config_defaults() {
        let config = GdpTableConfig::new("gdp.csv");
        assert_eq!(config.code_column, "Country Code");
        assert_eq!(config.name_column, "Country Name");
    }

    #[test]
    fn test_config_serde_defaults_fill_in() {
        let config: GdpTableConfig =
            serde_json::from_str(r#"{"path": "gdp.csv"}"#).unwrap();
        assert_eq!(config.path, "gdp.csv");
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.code_column, "Country Code");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = CodeTableConfig::new("code2.csv");
        config.quote = '\'';

        let json = serde_json::to_string(&config).unwrap();
        let parsed: CodeTableConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.path, "code2.csv");
        assert_eq!(parsed.quote, '\'');
    }
}
