use crate::domain::table::Table;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NAME_COLUMN: &str = "Name";
pub const USD_COLUMN: &str = "MC_USD_Billion";

/// A bank row as scraped, before any numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct BankRecord {
    pub name: String,
    pub mc_usd_billion: String,
}

/// A bank row after currency conversion. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd_billion: Option<f64>,
    #[serde(rename = "MC_GBP_Billion")]
    pub mc_gbp_billion: Option<f64>,
    #[serde(rename = "MC_EUR_Billion")]
    pub mc_eur_billion: Option<f64>,
    #[serde(rename = "MC_INR_Billion")]
    pub mc_inr_billion: Option<f64>,
}

impl ConvertedBankRecord {
    pub const COLUMNS: [&'static str; 5] = [
        NAME_COLUMN,
        USD_COLUMN,
        "MC_GBP_Billion",
        "MC_EUR_Billion",
        "MC_INR_Billion",
    ];

    pub fn converted(&self, currency: Currency) -> Option<f64> {
        match currency {
            Currency::Gbp => self.mc_gbp_billion,
            Currency::Eur => self.mc_eur_billion,
            Currency::Inr => self.mc_inr_billion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    /// Conversion targets in output column order.
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Currency::Gbp => "MC_GBP_Billion",
            Currency::Eur => "MC_EUR_Billion",
            Currency::Inr => "MC_INR_Billion",
        }
    }
}

/// Currency code to USD multiplier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same code replace earlier ones.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) {
        self.rates.insert(code.into(), rate);
    }

    pub fn rate(&self, code: &str) -> Result<f64> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| EtlError::MissingRateError {
                currency: code.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (code, rate) in iter {
            table.insert(code, rate);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    pub description: String,
    pub sql: String,
}

impl NamedQuery {
    pub fn new(description: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sql: sql.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub description: String,
    pub table: Table,
}
