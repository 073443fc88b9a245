use crate::domain::model::{BankRecord, NAME_COLUMN, USD_COLUMN};
use crate::domain::ports::{HttpSource, ProgressLog};
use crate::domain::table::{Table, Value};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_class_name;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_TABLE_CLASS: &str = "wikitable";

const RANK_COLUMN: &str = "Rank";
const BANK_NAME_HEADER: &str = "Bank name";
const MARKET_CAP_HEADER: &str = "Market cap(US$ billion)";

/// Scrapes the bank ranking table and turns it into [`BankRecord`]s.
pub struct Extractor<S: HttpSource> {
    source: S,
    url: String,
    table_class: String,
    log: Arc<dyn ProgressLog>,
}

impl<S: HttpSource> Extractor<S> {
    pub fn new(
        source: S,
        url: impl Into<String>,
        table_class: impl Into<String>,
        log: Arc<dyn ProgressLog>,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            table_class: table_class.into(),
            log,
        }
    }

    pub async fn extract(&self) -> Result<Vec<BankRecord>> {
        self.log.log("Starting Extract phase...")?;

        let html = self.source.fetch_text(&self.url).await.map_err(|e| {
            EtlError::extraction(format!("could not fetch {}: {}", self.url, e))
        })?;

        let table = parse_html_table(&html, &self.table_class)?;
        tracing::debug!(
            "Parsed table with columns {:?} and {} rows",
            table.columns(),
            table.len()
        );

        let records = into_bank_records(table)?;
        tracing::info!("Extracted {} bank records", records.len());

        self.log.log("Extract phase completed!")?;
        Ok(records)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EtlError::extraction(format!("invalid CSS selector '{}': {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Reads the first `table` carrying `class_marker`: `th` cells of the first row are the
/// headers, `td` cells of every later row are data. Rows without `td` cells are skipped.
pub fn parse_html_table(html: &str, class_marker: &str) -> Result<Table> {
    validate_class_name("table_class", class_marker)
        .map_err(|e| EtlError::extraction(e.to_string()))?;
    let document = Html::parse_document(html);
    let table_selector = selector(&format!("table.{}", class_marker))?;
    let row_selector = selector("tr")?;
    let header_selector = selector("th")?;
    let cell_selector = selector("td")?;

    let table = document.select(&table_selector).next().ok_or_else(|| {
        EtlError::extraction(format!("no table with class '{}' found", class_marker))
    })?;

    let mut rows = table.select(&row_selector);
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.select(&header_selector).map(cell_text).collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return Err(EtlError::extraction(format!(
            "table with class '{}' has no header row",
            class_marker
        )));
    }

    let mut parsed = Table::new(headers).map_err(|e| EtlError::extraction(e.to_string()))?;
    for row in rows {
        let cells: Vec<Value> = row
            .select(&cell_selector)
            .map(|cell| Value::Text(cell_text(cell)))
            .collect();
        if cells.is_empty() {
            continue;
        }
        parsed
            .push_row(cells)
            .map_err(|e| EtlError::extraction(e.to_string()))?;
    }

    Ok(parsed)
}

/// Drops the rank, renames the headers and projects every row onto [`BankRecord`].
pub fn into_bank_records(mut table: Table) -> Result<Vec<BankRecord>> {
    if !table.drop_column(RANK_COLUMN) {
        tracing::debug!("No '{}' column to drop", RANK_COLUMN);
    }

    for (from, to) in [(BANK_NAME_HEADER, NAME_COLUMN), (MARKET_CAP_HEADER, USD_COLUMN)] {
        table
            .rename_column(from, to)
            .map_err(|e| EtlError::extraction(e.to_string()))?;
    }

    let required = |column: &str| {
        table.column_index(column).ok_or_else(|| {
            EtlError::extraction(format!(
                "expected column '{}' is missing (found {:?})",
                column,
                table.columns()
            ))
        })
    };
    let name_index = required(NAME_COLUMN)?;
    let usd_index = required(USD_COLUMN)?;

    let ignored: Vec<&String> = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != NAME_COLUMN && c.as_str() != USD_COLUMN)
        .collect();
    if !ignored.is_empty() {
        tracing::warn!("Ignoring unexpected columns {:?}", ignored);
    }

    let records = table
        .rows()
        .iter()
        .map(|row| BankRecord {
            name: row[name_index].to_string(),
            mc_usd_billion: row[usd_index].to_string(),
        })
        .collect();

    Ok(records)
}
