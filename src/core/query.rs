use crate::adapters::sqlite::{quote_identifier, with_connection};
use crate::domain::model::{NamedQuery, QueryResult};
use crate::domain::ports::ProgressLog;
use crate::domain::table::{Table, Value};
use crate::utils::error::{EtlError, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::sync::Arc;

/// The summary queries run after every load: a row count and the five largest banks.
pub fn default_queries(table_name: &str) -> Vec<NamedQuery> {
    let table = quote_identifier(table_name);
    vec![
        NamedQuery::new(
            "Count rows",
            format!("SELECT COUNT(*) AS row_count FROM {};", table),
        ),
        NamedQuery::new(
            "Top 5 MC_USD_Billion",
            format!(
                "SELECT Name, MC_USD_Billion FROM {} ORDER BY MC_USD_Billion DESC LIMIT 5;",
                table
            ),
        ),
    ]
}

pub struct QueryRunner {
    log: Arc<dyn ProgressLog>,
}

impl QueryRunner {
    pub fn new(log: Arc<dyn ProgressLog>) -> Self {
        Self { log }
    }

    /// Runs `queries` in order on one session. The first failing query aborts the call.
    pub fn run_queries(
        &self,
        store_location: &str,
        queries: &[NamedQuery],
    ) -> Result<Vec<QueryResult>> {
        self.log.log("Running queries...")?;

        let session_error = |source: rusqlite::Error| EtlError::QueryError {
            description: format!("session on {}", store_location),
            source,
        };

        let results = with_connection(store_location, session_error, |conn| {
            let conn: &Connection = conn;
            queries
                .iter()
                .map(|query| run_query(conn, query))
                .collect::<Result<Vec<_>>>()
        })?;

        self.log.log("Queries completed!")?;
        Ok(results)
    }
}

fn to_value(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(format!("<{} byte blob>", bytes.len())),
    }
}

/// SQL allows repeated result column names (`SELECT Name, Name`); later repeats get a `_<n>` suffix.
fn unique_column_names(names: Vec<&str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.to_string();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        columns.push(candidate);
    }
    columns
}

fn run_query(conn: &Connection, query: &NamedQuery) -> Result<QueryResult> {
    let query_error = |source: rusqlite::Error| EtlError::QueryError {
        description: query.description.clone(),
        source,
    };

    tracing::debug!("Running query '{}': {}", query.description, query.sql.trim());
    let mut stmt = conn.prepare(&query.sql).map_err(query_error)?;
    let columns = unique_column_names(stmt.column_names());
    let width = columns.len();
    let mut table = Table::new(columns)?;

    let mut rows = stmt.query([]).map_err(query_error)?;
    while let Some(row) = rows.next().map_err(query_error)? {
        let cells = (0..width)
            .map(|i| row.get_ref(i).map(to_value).map_err(query_error))
            .collect::<Result<Vec<_>>>()?;
        table.push_row(cells)?;
    }

    tracing::debug!("Query '{}' returned {} rows", query.description, table.len());
    Ok(QueryResult {
        description: query.description.clone(),
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryProgressLog;
    use crate::core::load::DbSink;
    use crate::domain::model::ConvertedBankRecord;
    use tempfile::TempDir;

    fn converted(name: &str, usd: Option<f64>) -> ConvertedBankRecord {
        ConvertedBankRecord {
            name: name.to_string(),
            mc_usd_billion: usd,
            mc_gbp_billion: None,
            mc_eur_billion: None,
            mc_inr_billion: None,
        }
    }

    fn seeded_store(records: &[ConvertedBankRecord]) -> (TempDir, String) {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir
            .path()
            .join("Banks.db")
            .to_str()
            .unwrap()
            .to_string();
        DbSink::new(Arc::new(MemoryProgressLog::new()))
            .persist(records, &db, "Largest_banks")
            .unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_default_queries_count_and_top_five() {
        let records: Vec<ConvertedBankRecord> = (1..=7)
            .map(|i| converted(&format!("Bank {}", i), Some(i as f64 * 10.0)))
            .chain(std::iter::once(converted("Unknown", None)))
            .collect();
        let (_dir, db) = seeded_store(&records);
        let log = Arc::new(MemoryProgressLog::new());

        let results = QueryRunner::new(log.clone())
            .run_queries(&db, &default_queries("Largest_banks"))
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].description, "Count rows");
        assert_eq!(results[0].table.columns(), &["row_count"]);
        assert_eq!(
            results[0].table.get(0, "row_count").and_then(Value::as_i64),
            Some(8)
        );

        let top = &results[1].table;
        assert_eq!(top.columns(), &["Name", "MC_USD_Billion"]);
        assert_eq!(top.len(), 5);
        let names: Vec<&str> = (0..top.len())
            .filter_map(|i| top.get(i, "Name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["Bank 7", "Bank 6", "Bank 5", "Bank 4", "Bank 3"]);
        assert_eq!(top.get(0, "MC_USD_Billion").and_then(Value::as_f64), Some(70.0));

        assert_eq!(
            log.entries(),
            vec!["Running queries...", "Queries completed!"]
        );
    }

    #[test]
    fn test_queries_keep_given_order() {
        let (_dir, db) = seeded_store(&[converted("A", Some(100.5)), converted("C", Some(50.0))]);
        let queries = vec![
            NamedQuery::new("Top 1", "SELECT Name FROM Largest_banks ORDER BY MC_USD_Billion DESC LIMIT 1"),
            NamedQuery::new("Nothing", "SELECT Name FROM Largest_banks WHERE 0"),
        ];

        let results = QueryRunner::new(Arc::new(MemoryProgressLog::new()))
            .run_queries(&db, &queries)
            .unwrap();

        assert_eq!(results[0].description, "Top 1");
        assert_eq!(results[0].table.get(0, "Name").and_then(Value::as_str), Some("A"));
        assert_eq!(results[1].description, "Nothing");
        assert!(results[1].table.is_empty());
        assert_eq!(results[1].table.columns(), &["Name"]);
    }

    #[test]
    fn test_repeated_result_columns() {
        let (_dir, db) = seeded_store(&[converted("A", Some(100.5))]);
        let queries = vec![NamedQuery::new(
            "Names twice",
            "SELECT Name, Name, Name FROM Largest_banks",
        )];

        let results = QueryRunner::new(Arc::new(MemoryProgressLog::new()))
            .run_queries(&db, &queries)
            .unwrap();

        let table = &results[0].table;
        assert_eq!(table.columns(), &["Name", "Name_1", "Name_2"]);
        assert_eq!(table.get(0, "Name_2").and_then(Value::as_str), Some("A"));
    }

    #[test]
    fn test_failing_query_aborts() {
        let (_dir, db) = seeded_store(&[converted("A", Some(1.0))]);
        let log = Arc::new(MemoryProgressLog::new());
        let queries = vec![
            NamedQuery::new("Count rows", "SELECT COUNT(*) FROM Largest_banks"),
            NamedQuery::new("Broken", "SELECT * FROM no_such_table"),
            NamedQuery::new("Never runs", "SELECT 1"),
        ];

        let result = QueryRunner::new(log.clone()).run_queries(&db, &queries);

        match result {
            Err(EtlError::QueryError { description, .. }) => assert_eq!(description, "Broken"),
            other => panic!("expected QueryError, got {:?}", other),
        }
        assert_eq!(log.entries(), vec!["Running queries..."]);
    }
}
