use banks_etl::domain::table::Value;
use banks_etl::{EtlEngine, EtlError, FileProgressLog, HttpClient, PipelineSettings, RunState};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

const BANKS_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<h2><span id="By_market_capitalization">By market capitalization</span></h2>
<table class="wikitable">
<tbody>
<tr><th>Rank</th><th>Bank name</th><th>Market cap<br />(US$ billion)</th></tr>
<tr><td>1</td><td><a href="/wiki/JPMorgan_Chase">JPMorgan Chase</a></td><td>432.92
</td></tr>
<tr><td>2</td><td><a href="/wiki/Bank_of_America">Bank of America</a></td><td>231.52
</td></tr>
<tr><td>3</td><td>Industrial and Commercial Bank of China</td><td>194.56
</td></tr>
<tr><td>4</td><td>Agricultural Bank of China</td><td>160.68
</td></tr>
<tr><td>5</td><td>HDFC Bank</td><td>157.91
</td></tr>
<tr><td>6</td><td>Wells Fargo</td><td>155.87
</td></tr>
<tr><td>7</td><td>Mystery Bank</td><td>n/a
</td></tr>
</tbody>
</table>
<table class="wikitable"><tr><th>By total assets</th></tr><tr><td>ignored</td></tr></table>
</body></html>
"#;

const RATES_CSV: &str = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";

struct Fixture {
    _dir: TempDir,
    settings: PipelineSettings,
    log_path: std::path::PathBuf,
}

fn fixture(server: &MockServer) -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = |name: &str| dir.path().join(name).to_str().unwrap().to_string();
    let settings = PipelineSettings {
        source_url: server.url("/wiki/List_of_largest_banks"),
        table_class: "wikitable".to_string(),
        rates_url: server.url("/exchange_rate.csv"),
        csv_path: path("Largest_banks_data.csv"),
        db_path: path("Banks.db"),
        table_name: "Largest_banks".to_string(),
    };
    let log_path = dir.path().join("code_log.txt");
    Fixture {
        _dir: dir,
        settings,
        log_path,
    }
}

fn log_messages(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .split("\n\n")
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            // "[YYYY-MM-DD HH:MM:SS] " prefix
            assert!(entry.starts_with('['));
            entry[22..].to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_etl_with_real_http() {
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/wiki/List_of_largest_banks");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(BANKS_PAGE);
    });
    let rates_mock = server.mock(|when, then| {
        when.method(GET).path("/exchange_rate.csv");
        then.status(200).header("Content-Type", "text/csv").body(RATES_CSV);
    });

    let fx = fixture(&server);
    let log = Arc::new(FileProgressLog::new(&fx.log_path));
    let mut engine = EtlEngine::new(HttpClient::new(), fx.settings.clone(), log);

    let report = engine.run().await.unwrap();

    page_mock.assert();
    rates_mock.assert();
    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.extracted_records, 7);

    // CSV output
    let mut reader = csv::Reader::from_path(&fx.settings.csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "Name",
            "MC_USD_Billion",
            "MC_GBP_Billion",
            "MC_EUR_Billion",
            "MC_INR_Billion"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 7);
    assert_eq!(&rows[0][0], "JPMorgan Chase");
    assert_eq!(&rows[0][1], "432.92");
    assert_eq!(&rows[0][2], "346.34");
    assert_eq!(&rows[6][0], "Mystery Bank");
    assert_eq!(&rows[6][1], "");
    assert_eq!(&rows[6][4], "");

    // Query results
    let count = &report.query_results[0];
    assert_eq!(count.description, "Count rows");
    assert_eq!(count.table.get(0, "row_count").and_then(Value::as_i64), Some(7));

    let top = &report.query_results[1];
    assert_eq!(top.description, "Top 5 MC_USD_Billion");
    let names: Vec<&str> = (0..top.table.len())
        .filter_map(|i| top.table.get(i, "Name").and_then(Value::as_str))
        .collect();
    assert_eq!(
        names,
        vec![
            "JPMorgan Chase",
            "Bank of America",
            "Industrial and Commercial Bank of China",
            "Agricultural Bank of China",
            "HDFC Bank"
        ]
    );

    // Progress trail
    let messages = log_messages(&fx.log_path);
    let db = &fx.settings.db_path;
    let expected_prefix = vec![
        "ETL Script started!".to_string(),
        "Starting Extract phase...".to_string(),
        "Extract phase completed!".to_string(),
        "Starting Transform phase...".to_string(),
        "Transform phase completed!".to_string(),
        "Starting Load phase...".to_string(),
        "Load phase completed!".to_string(),
        "Saving table to SQLite database...".to_string(),
        format!("DataFrame successfully loaded to {} in table 'Largest_banks'!", db),
        "Running queries...".to_string(),
        "Queries completed!".to_string(),
    ];
    assert_eq!(messages[..expected_prefix.len()], expected_prefix[..]);
    assert!(messages[11].starts_with("Query: Count rows\n"));
    assert!(messages[12].starts_with("Query: Top 5 MC_USD_Billion\n"));
    assert!(messages[12].contains("JPMorgan Chase"));
    assert_eq!(messages.last().map(String::as_str), Some("Script finished!"));
}

#[tokio::test]
async fn test_repeated_runs_do_not_duplicate_rows() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/List_of_largest_banks");
        then.status(200).body(BANKS_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/exchange_rate.csv");
        then.status(200).body(RATES_CSV);
    });

    let fx = fixture(&server);
    for _ in 0..2 {
        let log = Arc::new(FileProgressLog::new(&fx.log_path));
        let report = EtlEngine::new(HttpClient::new(), fx.settings.clone(), log)
            .run()
            .await
            .unwrap();
        assert_eq!(
            report.query_results[0]
                .table
                .get(0, "row_count")
                .and_then(Value::as_i64),
            Some(7)
        );
    }

    // The progress log is append-only across runs.
    let messages = log_messages(&fx.log_path);
    let starts = messages.iter().filter(|m| *m == "ETL Script started!").count();
    assert_eq!(starts, 2);
}

#[tokio::test]
async fn test_source_failure_is_extraction_error() {
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/wiki/List_of_largest_banks");
        then.status(500);
    });

    let fx = fixture(&server);
    let log = Arc::new(FileProgressLog::new(&fx.log_path));
    let mut engine = EtlEngine::new(HttpClient::new(), fx.settings.clone(), log);

    let result = engine.run().await;

    page_mock.assert();
    assert!(matches!(result, Err(EtlError::ExtractionError { .. })));
    assert_eq!(engine.state(), RunState::Failed);
    assert!(!std::path::Path::new(&fx.settings.csv_path).exists());
    assert_eq!(
        log_messages(&fx.log_path),
        vec!["ETL Script started!", "Starting Extract phase..."]
    );
}

#[tokio::test]
async fn test_unreachable_rates_is_rate_resolution_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/List_of_largest_banks");
        then.status(200).body(BANKS_PAGE);
    });
    let rates_mock = server.mock(|when, then| {
        when.method(GET).path("/exchange_rate.csv");
        then.status(404);
    });

    let fx = fixture(&server);
    let log = Arc::new(FileProgressLog::new(&fx.log_path));
    let mut engine = EtlEngine::new(HttpClient::new(), fx.settings.clone(), log);

    let result = engine.run().await;

    rates_mock.assert();
    assert!(matches!(result, Err(EtlError::RateResolutionError { .. })));
    assert_eq!(engine.state(), RunState::Failed);
}

#[tokio::test]
async fn test_unwritable_csv_path_fails_before_database() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/List_of_largest_banks");
        then.status(200).body(BANKS_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/exchange_rate.csv");
        then.status(200).body(RATES_CSV);
    });

    let mut fx = fixture(&server);
    fx.settings.csv_path = fx
        .log_path
        .with_file_name("missing_dir")
        .join("out.csv")
        .to_str()
        .unwrap()
        .to_string();
    let log = Arc::new(FileProgressLog::new(&fx.log_path));
    let mut engine = EtlEngine::new(HttpClient::new(), fx.settings.clone(), log);

    let result = engine.run().await;

    assert!(matches!(result, Err(EtlError::IoError(_))));
    assert!(!std::path::Path::new(&fx.settings.db_path).exists());
    let messages = log_messages(&fx.log_path);
    assert_eq!(messages.last().map(String::as_str), Some("Starting Load phase..."));
}
