use crate::core::extract::{Extractor, DEFAULT_SOURCE_URL, DEFAULT_TABLE_CLASS};
use crate::core::load::{DbSink, FileSink, DEFAULT_CSV_PATH, DEFAULT_DB_PATH, DEFAULT_TABLE_NAME};
use crate::core::query::{default_queries, QueryRunner};
use crate::core::transform::{RateResolver, Transformer, DEFAULT_RATES_URL};
use crate::domain::model::{NamedQuery, QueryResult};
use crate::domain::ports::{ConfigProvider, HttpSource, ProgressLog};
use crate::utils::error::Result;
use std::fmt;
use std::sync::Arc;

/// Locations the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub source_url: String,
    pub table_class: String,
    pub rates_url: String,
    pub csv_path: String,
    pub db_path: String,
    pub table_name: String,
}

impl PipelineSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            source_url: config.source_url().to_string(),
            table_class: config.table_class().to_string(),
            rates_url: config.rates_url().to_string(),
            csv_path: config.csv_path().to_string(),
            db_path: config.db_path().to_string(),
            table_name: config.table_name().to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            table_class: DEFAULT_TABLE_CLASS.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            csv_path: DEFAULT_CSV_PATH.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Transforming,
    SavingFile,
    SavingDb,
    Querying,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Transforming => "transforming",
            RunState::SavingFile => "saving file",
            RunState::SavingDb => "saving database",
            RunState::Querying => "querying",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub extracted_records: usize,
    pub query_results: Vec<QueryResult>,
}

/// Runs extract, transform, CSV save, database save and the summary queries in that order.
///
/// Any stage failure stops the run in [`RunState::Failed`]; artifacts already written stay.
pub struct EtlEngine<S: HttpSource + Clone> {
    extractor: Extractor<S>,
    transformer: Transformer<S>,
    file_sink: FileSink,
    db_sink: DbSink,
    query_runner: QueryRunner,
    settings: PipelineSettings,
    queries: Vec<NamedQuery>,
    log: Arc<dyn ProgressLog>,
    state: RunState,
}

impl<S: HttpSource + Clone> EtlEngine<S> {
    pub fn new(source: S, settings: PipelineSettings, log: Arc<dyn ProgressLog>) -> Self {
        let extractor = Extractor::new(
            source.clone(),
            settings.source_url.clone(),
            settings.table_class.clone(),
            log.clone(),
        );
        let transformer = Transformer::new(
            RateResolver::new(source, settings.rates_url.clone()),
            log.clone(),
        );

        Self {
            extractor,
            transformer,
            file_sink: FileSink::new(log.clone()),
            db_sink: DbSink::new(log.clone()),
            query_runner: QueryRunner::new(log.clone()),
            queries: default_queries(&settings.table_name),
            settings,
            log,
            state: RunState::Idle,
        }
    }

    /// Replaces the summary queries run at the end.
    pub fn with_queries(mut self, queries: Vec<NamedQuery>) -> Self {
        self.queries = queries;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&mut self) -> Result<RunReport> {
        match self.run_stages().await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("❌ ETL run failed while {}: {}", self.state, e);
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::info!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
    }

    async fn run_stages(&mut self) -> Result<RunReport> {
        self.log.log("ETL Script started!")?;

        self.transition(RunState::Extracting);
        let records = self.extractor.extract().await?;
        let extracted_records = records.len();

        self.transition(RunState::Transforming);
        let converted = self.transformer.transform(records).await?;

        self.transition(RunState::SavingFile);
        self.file_sink.save(&converted, &self.settings.csv_path)?;

        self.transition(RunState::SavingDb);
        self.db_sink
            .persist(&converted, &self.settings.db_path, &self.settings.table_name)?;

        self.transition(RunState::Querying);
        let query_results = self
            .query_runner
            .run_queries(&self.settings.db_path, &self.queries)?;

        for result in &query_results {
            tracing::info!("Query '{}' returned {} rows", result.description, result.table.len());
            self.log
                .log(&format!("Query: {}\n{}", result.description, result.table))?;
        }

        self.log.log("Script finished!")?;
        self.transition(RunState::Done);

        Ok(RunReport {
            state: self.state,
            extracted_records,
            query_results,
        })
    }
}
