use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, QueryOrder, Select, Set};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::currency::{normalize_code, Currency};

/// Fractional digits kept for every stored rate
pub const RATE_SCALE: u32 = 4;

/// Largest rate the `DECIMAL(12, 4)` column can hold
pub const MAX_RATE: Decimal = dec!(99999999.9999);

/// Full message reported when a provider already quotes the currency
pub const DUPLICATE_PAIR_MESSAGE: &str = "Provider already has a rate for this currency";

/// A single provider's quoted exchange rate for one currency
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub provider: String,

    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub rate: Decimal,

    pub currency: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        active_model.normalize_fields();

        let now = Utc::now();
        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

impl ActiveModel {
    // Idempotent, so values already prepared by the service pass through unchanged.
    fn normalize_fields(&mut self) {
        if let ActiveValue::Set(provider) = &self.provider {
            let normalized = normalize_provider(provider);
            self.provider = Set(normalized);
        }
        if let ActiveValue::Set(currency) = &self.currency {
            let normalized = normalize_code(currency);
            self.currency = Set(normalized);
        }
        if let ActiveValue::Set(rate) = &self.rate {
            let rounded = round_rate(*rate);
            self.rate = Set(rounded);
        }
    }
}

impl Model {
    /// Formatted rate, e.g. `"280.5000 PKR"`. Computed on read, never stored.
    pub fn rate_display(&self) -> String {
        format!("{:.prec$} {}", self.rate, self.currency, prec = RATE_SCALE as usize)
    }

    /// Writable attributes of this record
    pub fn attributes(&self) -> RateAttributes {
        RateAttributes {
            provider: self.provider.clone(),
            rate: Some(self.rate),
            currency: self.currency.clone(),
        }
    }
}

/// Composable query scopes over rate selects.
///
/// ```ignore
/// rate::Entity::find().by_currency("pkr").best_rates().all(db).await?;
/// ```
pub trait RateScopes: Sized {
    /// Rates whose currency equals `code` uppercased
    fn by_currency(self, code: &str) -> Self;

    /// Rates whose stored provider equals `name` exactly
    fn by_provider(self, name: &str) -> Self;

    /// Highest rate first; ties fall back to insertion order
    fn best_rates(self) -> Self;
}

impl RateScopes for Select<Entity> {
    fn by_currency(self, code: &str) -> Self {
        self.filter(Column::Currency.eq(normalize_code(code)))
    }

    fn by_provider(self, name: &str) -> Self {
        self.filter(Column::Provider.eq(name))
    }

    fn best_rates(self) -> Self {
        self.order_by_desc(Column::Rate).order_by_asc(Column::Id)
    }
}

impl Entity {
    pub fn by_currency(code: &str) -> Select<Entity> {
        Self::find().by_currency(code)
    }

    pub fn by_provider(name: &str) -> Select<Entity> {
        Self::find().by_provider(name)
    }

    pub fn best_rates() -> Select<Entity> {
        Self::find().best_rates()
    }
}

/// Trims, collapses inner whitespace and title-cases a provider name.
///
/// Only whitespace separates words: each word keeps an uppercase first
/// character and a lowercase remainder, so `"al-ansari"` becomes `"Al-ansari"`.
pub fn normalize_provider(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Rounds to the stored scale, midpoint away from zero.
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Writable fields of a rate, validated before every create and update
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct RateAttributes {
    #[validate(
        length(min = 2, max = 100, message = "must be between 2 and 100 characters"),
        custom = "validate_provider_present"
    )]
    pub provider: String,

    /// `None` when the caller left the rate out
    #[validate(custom = "validate_rate_range")]
    pub rate: Option<Decimal>,

    #[validate(custom = "validate_supported_currency")]
    pub currency: String,
}

impl RateAttributes {
    pub fn new(provider: impl Into<String>, rate: Decimal, currency: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            rate: Some(rate),
            currency: currency.into(),
        }
    }

    /// Applies provider and currency normalization. The rate keeps full
    /// precision so positivity is judged before rounding.
    pub fn normalized(self) -> Self {
        Self {
            provider: normalize_provider(&self.provider),
            rate: self.rate,
            currency: normalize_code(&self.currency),
        }
    }

    /// Runs every field rule, returning all violations as full messages.
    pub fn check(&self) -> Result<(), Vec<String>> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if self.rate.is_none() {
            errors.add("rate", blank_error());
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(full_messages(&errors))
        }
    }
}

const FIELD_LABELS: [(&str, &str); 3] = [
    ("provider", "Provider"),
    ("rate", "Rate"),
    ("currency", "Currency"),
];

/// Flattens validator output into `"<Field> <message>"` lines in field order.
pub fn full_messages(errors: &ValidationErrors) -> Vec<String> {
    let field_errors = errors.field_errors();
    let mut messages = Vec::new();

    for (field, label) in FIELD_LABELS {
        if let Some(errs) = field_errors.get(field) {
            for err in errs.iter() {
                let detail = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                messages.push(format!("{} {}", label, detail));
            }
        }
    }

    messages
}

fn blank_error() -> ValidationError {
    let mut err = ValidationError::new("blank");
    err.message = Some("can't be blank".into());
    err
}

fn validate_provider_present(provider: &str) -> Result<(), ValidationError> {
    if provider.trim().is_empty() {
        return Err(blank_error());
    }
    Ok(())
}

// Judged at full precision; rounding happens after validation.
fn validate_rate_range(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate <= Decimal::ZERO {
        let mut err = ValidationError::new("greater_than");
        err.message = Some("must be greater than 0".into());
        return Err(err);
    }
    if *rate > MAX_RATE {
        let mut err = ValidationError::new("less_than_or_equal_to");
        err.message = Some(format!("must be less than or equal to {}", MAX_RATE).into());
        return Err(err);
    }
    Ok(())
}

fn validate_supported_currency(currency: &str) -> Result<(), ValidationError> {
    if !Currency::is_supported(currency) {
        let mut err = ValidationError::new("inclusion");
        err.message = Some(
            format!(
                "is not included in the list ({})",
                Currency::codes().join(", ")
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}
