use crate::domain::model::{BankRecord, ConvertedBankRecord, Currency, RateTable};
use crate::domain::ports::{HttpSource, ProgressLog};
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_RATES_URL: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv";

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Loads the `Currency,Rate` CSV resource into a [`RateTable`].
pub struct RateResolver<S: HttpSource> {
    source: S,
    url: String,
}

impl<S: HttpSource> RateResolver<S> {
    pub fn new(source: S, url: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
        }
    }

    pub async fn resolve_rates(&self) -> Result<RateTable> {
        let body = self.source.fetch_text(&self.url).await.map_err(|e| {
            EtlError::rate_resolution(format!("could not fetch {}: {}", self.url, e))
        })?;
        let rates = parse_rates(&body)?;
        tracing::debug!("Resolved {} exchange rates from {}", rates.len(), self.url);
        Ok(rates)
    }
}

/// Parses `Currency,Rate` rows. A repeated currency code keeps its last rate.
pub fn parse_rates(csv_text: &str) -> Result<RateTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EtlError::rate_resolution(format!("unreadable header: {}", e)))?;
    for required in ["Currency", "Rate"] {
        if !headers.iter().any(|h| h == required) {
            return Err(EtlError::rate_resolution(format!(
                "missing '{}' column in rate resource",
                required
            )));
        }
    }

    let mut rates = RateTable::new();
    for (line, row) in reader.deserialize::<RateRow>().enumerate() {
        let row = row.map_err(|e| {
            EtlError::rate_resolution(format!("malformed rate row {}: {}", line + 1, e))
        })?;
        if !row.rate.is_finite() || row.rate <= 0.0 {
            return Err(EtlError::rate_resolution(format!(
                "rate for {} must be a positive number, got {}",
                row.currency, row.rate
            )));
        }
        rates.insert(row.currency, row.rate);
    }

    if rates.is_empty() {
        return Err(EtlError::rate_resolution("rate resource has no rows"));
    }
    Ok(rates)
}

/// Best-effort numeric coercion: anything that is not a finite number becomes `None`.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rounds to two decimals, ties to even on the scaled value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Converts every record using the GBP, EUR and INR rates.
///
/// All three rates are looked up before any record is touched, so a missing rate fails
/// the whole batch with [`EtlError::MissingRateError`].
pub fn convert_records(
    records: Vec<BankRecord>,
    rates: &RateTable,
) -> Result<Vec<ConvertedBankRecord>> {
    let [gbp, eur, inr] = Currency::ALL;
    let gbp_rate = rates.rate(gbp.code())?;
    let eur_rate = rates.rate(eur.code())?;
    let inr_rate = rates.rate(inr.code())?;

    let converted = records
        .into_iter()
        .map(|record| {
            let usd = coerce_numeric(&record.mc_usd_billion);
            if usd.is_none() {
                tracing::debug!(
                    "Market cap '{}' for {} is not numeric, leaving it empty",
                    record.mc_usd_billion,
                    record.name
                );
            }
            let convert = |rate: f64| usd.map(|v| round2(v * rate));
            ConvertedBankRecord {
                name: record.name,
                mc_usd_billion: usd,
                mc_gbp_billion: convert(gbp_rate),
                mc_eur_billion: convert(eur_rate),
                mc_inr_billion: convert(inr_rate),
            }
        })
        .collect();

    Ok(converted)
}

pub struct Transformer<S: HttpSource> {
    resolver: RateResolver<S>,
    log: Arc<dyn ProgressLog>,
}

impl<S: HttpSource> Transformer<S> {
    pub fn new(resolver: RateResolver<S>, log: Arc<dyn ProgressLog>) -> Self {
        Self { resolver, log }
    }

    pub async fn transform(&self, records: Vec<BankRecord>) -> Result<Vec<ConvertedBankRecord>> {
        self.log.log("Starting Transform phase...")?;

        let rates = self.resolver.resolve_rates().await?;
        let converted = convert_records(records, &rates)?;

        let nulls = converted
            .iter()
            .filter(|r| r.mc_usd_billion.is_none())
            .count();
        tracing::info!(
            "Transformed {} records ({} without a numeric market cap)",
            converted.len(),
            nulls
        );

        self.log.log("Transform phase completed!")?;
        Ok(converted)
    }
}
