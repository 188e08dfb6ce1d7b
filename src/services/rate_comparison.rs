use crate::{
    db::DbPool,
    entities::rate::{self, RateScopes, RATE_SCALE},
    errors::ServiceError,
    models::currency::normalize_code,
};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One provider's quote as it appears in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub provider: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub rate_display: String,
}

impl From<&rate::Model> for RateEntry {
    fn from(model: &rate::Model) -> Self {
        Self {
            provider: model.provider.clone(),
            rate: model.rate,
            rate_display: model.rate_display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_providers: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub median_rate: Decimal,
}

/// Comparative statistics across every provider quoting one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateComparison {
    pub currency: String,
    /// RFC 3339 moment the summary was computed
    pub timestamp: String,
    pub summary: ComparisonSummary,
    pub best_rate: RateEntry,
    pub worst_rate: RateEntry,
    /// Best first, same order as the `best_rates` scope
    pub all_rates: Vec<RateEntry>,
}

/// Result of a comparison request. An empty currency is an expected outcome,
/// not an error, so callers branch on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Found(RateComparison),
    NoRates { currency: String, message: String },
}

impl ComparisonOutcome {
    fn no_rates(currency: String) -> Self {
        let message = format!("No rates found for {}", currency);
        ComparisonOutcome::NoRates { currency, message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ComparisonOutcome::Found(_))
    }

    pub fn comparison(&self) -> Option<&RateComparison> {
        match self {
            ComparisonOutcome::Found(comparison) => Some(comparison),
            ComparisonOutcome::NoRates { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ComparisonOutcome::Found(_) => None,
            ComparisonOutcome::NoRates { message, .. } => Some(message),
        }
    }
}

/// Aggregates all quotes for a currency into a comparison summary
#[derive(Clone)]
pub struct RateComparisonService {
    db: Arc<DbPool>,
}

impl RateComparisonService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn compare(&self, currency: &str) -> Result<ComparisonOutcome, ServiceError> {
        let currency = normalize_code(currency);

        let rates = rate::Entity::find()
            .by_currency(&currency)
            .best_rates()
            .all(&*self.db)
            .await?;

        debug!(count = rates.len(), %currency, "rates loaded for comparison");

        let outcome = match summarize(&currency, &rates, Utc::now()) {
            Some(comparison) => {
                counter!("remit_rates.comparisons.found", 1);
                ComparisonOutcome::Found(comparison)
            }
            None => {
                counter!("remit_rates.comparisons.empty", 1);
                ComparisonOutcome::no_rates(currency)
            }
        };

        Ok(outcome)
    }
}

/// Builds the comparison from rates already ordered best first.
///
/// Returns `None` when `rates` is empty.
pub fn summarize(
    currency: &str,
    rates: &[rate::Model],
    now: DateTime<Utc>,
) -> Option<RateComparison> {
    let best = rates.first()?;
    let worst = rates.last()?;

    let values: Vec<Decimal> = rates.iter().map(|r| r.rate).collect();

    Some(RateComparison {
        currency: currency.to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        summary: ComparisonSummary {
            total_providers: rates.len(),
            average_rate: average(&values)?,
            median_rate: median(&values)?,
        },
        best_rate: best.into(),
        worst_rate: worst.into(),
        all_rates: rates.iter().map(RateEntry::from).collect(),
    })
}

/// Arithmetic mean rounded to the stored scale
pub fn average(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(round_stat(sum / Decimal::from(values.len())))
}

/// Median of the values sorted ascending; even counts average the two middle values.
pub fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort();

    let mid = sorted.len() / 2;
    let value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / Decimal::TWO
    } else {
        sorted[mid]
    };

    Some(round_stat(value))
}

fn round_stat(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
