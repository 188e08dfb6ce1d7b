use crate::{
    db::DbPool,
    entities::rate::{self, round_rate, RateAttributes, RateScopes, DUPLICATE_PAIR_MESSAGE},
    errors::ServiceError,
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fields for a new rate. Absent fields deserialize empty and are reported
/// by validation alongside every other violation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRate {
    pub provider: String,
    pub rate: Option<Decimal>,
    pub currency: String,
}

impl NewRate {
    pub fn new(provider: impl Into<String>, rate: Decimal, currency: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            rate: Some(rate),
            currency: currency.into(),
        }
    }
}

impl From<NewRate> for RateAttributes {
    fn from(input: NewRate) -> Self {
        RateAttributes {
            provider: input.provider,
            rate: input.rate,
            currency: input.currency,
        }
    }
}

/// Partial update; unspecified fields keep their stored values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatePatch {
    pub provider: Option<String>,
    pub rate: Option<Decimal>,
    pub currency: Option<String>,
}

impl RatePatch {
    pub fn apply(self, current: RateAttributes) -> RateAttributes {
        RateAttributes {
            provider: self.provider.unwrap_or(current.provider),
            rate: self.rate.or(current.rate),
            currency: self.currency.unwrap_or(current.currency),
        }
    }
}

/// Checked, normalized fields ready to persist
#[derive(Debug)]
struct PreparedRate {
    provider: String,
    rate: Decimal,
    currency: String,
}

/// Optional filters for listing rates
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    pub currency: Option<String>,
    pub provider: Option<String>,
    /// Order by rate descending instead of by id
    pub best_first: bool,
}

/// Create/read/update/delete and scoped lookups for rate records
#[derive(Clone)]
pub struct RateService {
    db: Arc<DbPool>,
}

impl RateService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a rate after normalizing and validating it
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewRate) -> Result<rate::Model, ServiceError> {
        let attrs = self.prepare(input.into(), None).await?;

        let active = rate::ActiveModel {
            provider: Set(attrs.provider),
            rate: Set(attrs.rate),
            currency: Set(attrs.currency),
            ..Default::default()
        };

        let model = active.insert(&*self.db).await.map_err(map_write_error)?;

        counter!("remit_rates.rates.created", 1);
        info!(
            id = model.id,
            provider = %model.provider,
            currency = %model.currency,
            "rate created"
        );

        Ok(model)
    }

    /// Gets a rate by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<rate::Model, ServiceError> {
        rate::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replaces the supplied fields of an existing rate
    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, patch: RatePatch) -> Result<rate::Model, ServiceError> {
        let existing = self.get(id).await?;
        let attrs = self
            .prepare(patch.apply(existing.attributes()), Some(id))
            .await?;

        let mut active: rate::ActiveModel = existing.into();
        active.provider = Set(attrs.provider);
        active.rate = Set(attrs.rate);
        active.currency = Set(attrs.currency);

        let model = active.update(&*self.db).await.map_err(map_write_error)?;

        counter!("remit_rates.rates.updated", 1);
        info!(id = model.id, "rate updated");

        Ok(model)
    }

    /// Deletes a rate; reports not-found when nothing was removed
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = rate::Entity::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(not_found(id));
        }

        counter!("remit_rates.rates.deleted", 1);
        info!(id, "rate deleted");
        Ok(())
    }

    /// Lists rates matching the optional filters
    #[instrument(skip(self))]
    pub async fn list(&self, filter: RateFilter) -> Result<Vec<rate::Model>, ServiceError> {
        let mut query = rate::Entity::find();

        if let Some(currency) = filter.currency.as_deref() {
            query = query.by_currency(currency);
        }
        if let Some(provider) = filter.provider.as_deref() {
            query = query.by_provider(provider);
        }

        query = if filter.best_first {
            query.best_rates()
        } else {
            query.order_by_asc(rate::Column::Id)
        };

        Ok(query.all(&*self.db).await?)
    }

    pub async fn by_currency(&self, code: &str) -> Result<Vec<rate::Model>, ServiceError> {
        Ok(rate::Entity::by_currency(code)
            .order_by_asc(rate::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn by_provider(&self, name: &str) -> Result<Vec<rate::Model>, ServiceError> {
        Ok(rate::Entity::by_provider(name)
            .order_by_asc(rate::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Rates ordered best first, optionally restricted to one currency
    pub async fn best_rates(&self, currency: Option<&str>) -> Result<Vec<rate::Model>, ServiceError> {
        let query = match currency {
            Some(code) => rate::Entity::by_currency(code).best_rates(),
            None => rate::Entity::best_rates(),
        };
        Ok(query.all(&*self.db).await?)
    }

    // Normalize, then validate at full precision, then round for persistence.
    async fn prepare(
        &self,
        attrs: RateAttributes,
        existing_id: Option<i32>,
    ) -> Result<PreparedRate, ServiceError> {
        let attrs = attrs.normalized();
        let mut errors = attrs.check().err().unwrap_or_default();

        if self
            .pair_taken(&attrs.provider, &attrs.currency, existing_id)
            .await?
        {
            errors.push(DUPLICATE_PAIR_MESSAGE.to_string());
        }

        match attrs.rate {
            Some(rate) if errors.is_empty() => Ok(PreparedRate {
                provider: attrs.provider,
                rate: round_rate(rate),
                currency: attrs.currency,
            }),
            _ => {
                counter!("remit_rates.rates.rejected", 1);
                warn!(?errors, "rate rejected");
                Err(ServiceError::ValidationFailed(errors))
            }
        }
    }

    async fn pair_taken(
        &self,
        provider: &str,
        currency: &str,
        existing_id: Option<i32>,
    ) -> Result<bool, DbErr> {
        let mut query = rate::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(rate::Column::Provider)))
                    .eq(provider.to_lowercase()),
            )
            .filter(rate::Column::Currency.eq(currency));

        if let Some(id) = existing_id {
            query = query.filter(rate::Column::Id.ne(id));
        }

        Ok(query.count(&*self.db).await? > 0)
    }
}

fn not_found(id: i32) -> ServiceError {
    ServiceError::NotFound(format!("Rate with ID {} not found", id))
}

// A concurrent writer can claim the pair between the check and the insert;
// the unique index rejects the loser and it reports the same duplicate message.
fn map_write_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            counter!("remit_rates.rates.rejected", 1);
            ServiceError::validation(DUPLICATE_PAIR_MESSAGE)
        }
        _ => ServiceError::DatabaseError(err),
    }
}
