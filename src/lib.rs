pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{FileProgressLog, HttpClient, MemoryProgressLog};
pub use crate::core::etl::{EtlEngine, PipelineSettings, RunReport, RunState};
pub use utils::error::{EtlError, Result};
