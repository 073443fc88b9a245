pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_class_name, validate_identifier, validate_path, validate_url, Validate,
};

#[cfg(feature = "cli")]
use crate::adapters::progress_log::DEFAULT_LOG_FILE;
#[cfg(feature = "cli")]
use crate::core::extract::{DEFAULT_SOURCE_URL, DEFAULT_TABLE_CLASS};
#[cfg(feature = "cli")]
use crate::core::load::{DEFAULT_CSV_PATH, DEFAULT_DB_PATH, DEFAULT_TABLE_NAME};
#[cfg(feature = "cli")]
use crate::core::transform::DEFAULT_RATES_URL;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub use toml_config::TomlConfig;

/// Checks every location a [`ConfigProvider`] hands to the pipeline.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("source_url", config.source_url())?;
    validate_class_name("table_class", config.table_class())?;
    validate_url("rates_url", config.rates_url())?;
    validate_path("csv_path", config.csv_path())?;
    validate_path("db_path", config.db_path())?;
    validate_identifier("table_name", config.table_name())?;
    validate_path("log_file", config.log_file())?;
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "banks-etl")]
#[command(about = "Scrape the largest banks table, convert market caps and load them into CSV and SQLite")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    #[arg(long, default_value = DEFAULT_TABLE_CLASS, help = "CSS class marking the bank table")]
    pub table_class: String,

    #[arg(long, default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    pub csv_path: String,

    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    #[arg(long, help = "Read settings from a TOML file instead of the flags above")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn table_class(&self) -> &str {
        &self.table_class
    }

    fn rates_url(&self) -> &str {
        &self.rates_url
    }

    fn csv_path(&self) -> &str {
        &self.csv_path
    }

    fn db_path(&self) -> &str {
        &self.db_path
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn log_file(&self) -> &str {
        &self.log_file
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
