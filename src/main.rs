use banks_etl::core::ConfigProvider;
use banks_etl::utils::{logger, validation::Validate};
use banks_etl::{
    CliConfig, EtlEngine, EtlError, FileProgressLog, HttpClient, PipelineSettings, TomlConfig,
};
use clap::Parser;
use std::sync::Arc;

fn load_config(cli: CliConfig) -> Result<Box<dyn ConfigProvider>, EtlError> {
    match cli.config.as_deref() {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            Ok(Box::new(config))
        }
        None => {
            cli.validate()?;
            Ok(Box::new(cli))
        }
    }
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting banks-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };

    let log = Arc::new(FileProgressLog::new(config.log_file()));
    let settings = PipelineSettings::from_config(config.as_ref());
    let mut engine = EtlEngine::new(HttpClient::new(), settings, log);

    match engine.run().await {
        Ok(report) => {
            tracing::info!(
                "✅ ETL process completed: {} banks extracted, {} queries run",
                report.extracted_records,
                report.query_results.len()
            );
            for result in &report.query_results {
                println!("{}\n{}\n", result.description, result.table);
            }
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", engine.settings().csv_path);
        }
        Err(e) => {
            tracing::error!("❌ ETL process failed: {}", e);
            exit_with(&e);
        }
    }
}
