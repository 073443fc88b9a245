use crate::utils::error::Result;
use async_trait::async_trait;

/// Fetches a remote resource as text.
#[async_trait]
pub trait HttpSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Appends human-readable progress messages to a persistent trail.
pub trait ProgressLog: Send + Sync {
    fn log(&self, message: &str) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    fn table_class(&self) -> &str;
    fn rates_url(&self) -> &str;
    fn csv_path(&self) -> &str;
    fn db_path(&self) -> &str;
    fn table_name(&self) -> &str;
    fn log_file(&self) -> &str;
}
