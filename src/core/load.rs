use crate::adapters::sqlite::{quote_identifier, with_connection};
use crate::domain::model::{ConvertedBankRecord, NAME_COLUMN};
use crate::domain::ports::ProgressLog;
use crate::utils::error::{EtlError, Result};
use rusqlite::params;
use std::fs::File;
use std::sync::Arc;

pub const DEFAULT_CSV_PATH: &str = "./Largest_banks_data.csv";
pub const DEFAULT_DB_PATH: &str = "Banks.db";
pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";

/// Failures of the underlying file surface as `IoError`; only encoding problems stay `CsvError`.
fn write_error(e: csv::Error) -> EtlError {
    if !e.is_io_error() {
        return EtlError::CsvError(e);
    }
    match e.into_kind() {
        csv::ErrorKind::Io(io) => EtlError::IoError(io),
        kind => EtlError::ProcessingError {
            message: format!("CSV write failed: {:?}", kind),
        },
    }
}

/// Writes converted records as CSV, replacing any existing file.
pub struct FileSink {
    log: Arc<dyn ProgressLog>,
}

impl FileSink {
    pub fn new(log: Arc<dyn ProgressLog>) -> Self {
        Self { log }
    }

    pub fn save(&self, records: &[ConvertedBankRecord], path: &str) -> Result<()> {
        self.log.log("Starting Load phase...")?;

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        // Written explicitly so an empty batch still gets a header row.
        writer
            .write_record(ConvertedBankRecord::COLUMNS)
            .map_err(write_error)?;
        for record in records {
            writer.serialize(record).map_err(write_error)?;
        }
        writer.flush()?;

        tracing::info!("Saved {} records to {}", records.len(), path);
        self.log.log("Load phase completed!")?;
        Ok(())
    }
}

/// Replaces a SQLite table with the converted records.
pub struct DbSink {
    log: Arc<dyn ProgressLog>,
}

impl DbSink {
    pub fn new(log: Arc<dyn ProgressLog>) -> Self {
        Self { log }
    }

    pub fn persist(
        &self,
        records: &[ConvertedBankRecord],
        store_location: &str,
        table_name: &str,
    ) -> Result<()> {
        self.log.log("Saving table to SQLite database...")?;

        let persistence_error = |source: rusqlite::Error| EtlError::PersistenceError {
            store: store_location.to_string(),
            table: table_name.to_string(),
            source,
        };

        let table = quote_identifier(table_name);
        let column_defs = ConvertedBankRecord::COLUMNS
            .iter()
            .map(|column| {
                let sql_type = if *column == NAME_COLUMN { "TEXT" } else { "REAL" };
                format!("{} {}", quote_identifier(column), sql_type)
            })
            .collect::<Vec<_>>()
            .join(", ");

        with_connection(store_location, &persistence_error, |conn| {
            let tx = conn.transaction().map_err(persistence_error)?;
            tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])
                .map_err(persistence_error)?;
            tx.execute(&format!("CREATE TABLE {} ({})", table, column_defs), [])
                .map_err(persistence_error)?;

            {
                let mut insert = tx
                    .prepare(&format!(
                        "INSERT INTO {} VALUES (?1, ?2, ?3, ?4, ?5)",
                        table
                    ))
                    .map_err(persistence_error)?;
                for record in records {
                    insert
                        .execute(params![
                            record.name,
                            record.mc_usd_billion,
                            record.mc_gbp_billion,
                            record.mc_eur_billion,
                            record.mc_inr_billion,
                        ])
                        .map_err(persistence_error)?;
                }
            }

            tx.commit().map_err(persistence_error)?;
            Ok(())
        })?;

        tracing::info!(
            "Persisted {} records to {} ({})",
            records.len(),
            store_location,
            table_name
        );
        self.log.log(&format!(
            "DataFrame successfully loaded to {} in table '{}'!",
            store_location, table_name
        ))?;
        Ok(())
    }
}
