use crate::adapters::progress_log::DEFAULT_LOG_FILE;
use crate::core::extract::{DEFAULT_SOURCE_URL, DEFAULT_TABLE_CLASS};
use crate::core::load::{DEFAULT_CSV_PATH, DEFAULT_DB_PATH, DEFAULT_TABLE_NAME};
use crate::core::transform::DEFAULT_RATES_URL;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File based settings. Every field is optional and falls back to the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub table_class: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub csv_path: Option<String>,
    pub db_path: Option<String>,
    pub table_name: Option<String>,
    pub log_file: Option<String>,
}

impl TomlConfig {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for TomlConfig {
    fn source_url(&self) -> &str {
        self.source.url.as_deref().unwrap_or(DEFAULT_SOURCE_URL)
    }

    fn table_class(&self) -> &str {
        self.source
            .table_class
            .as_deref()
            .unwrap_or(DEFAULT_TABLE_CLASS)
    }

    fn rates_url(&self) -> &str {
        self.rates.url.as_deref().unwrap_or(DEFAULT_RATES_URL)
    }

    fn csv_path(&self) -> &str {
        self.output.csv_path.as_deref().unwrap_or(DEFAULT_CSV_PATH)
    }

    fn db_path(&self) -> &str {
        self.output.db_path.as_deref().unwrap_or(DEFAULT_DB_PATH)
    }

    fn table_name(&self) -> &str {
        self.output
            .table_name
            .as_deref()
            .unwrap_or(DEFAULT_TABLE_NAME)
    }

    fn log_file(&self) -> &str {
        self.output.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        super::validate_provider(self)
    }
}
