use super::common::{
    created_response, no_content_response, parse_currency, parse_json, success_response,
};
use crate::{
    entities::rate,
    errors::ServiceError,
    models::currency::Currency,
    services::{
        rate_comparison::ComparisonOutcome,
        rates::{NewRate, RateFilter, RatePatch},
    },
    ApiResponse, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Rate as exposed over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateResponse {
    pub id: i32,
    pub provider: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub currency: String,
    pub rate_display: String,
    /// Alias of `rate_display`
    pub rate_formatted: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<rate::Model> for RateResponse {
    fn from(model: rate::Model) -> Self {
        let rate_display = model.rate_display();
        Self {
            id: model.id,
            provider: model.provider,
            rate: model.rate,
            currency: model.currency,
            rate_formatted: rate_display.clone(),
            rate_display,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn to_responses(models: Vec<rate::Model>) -> Vec<RateResponse> {
    models.into_iter().map(RateResponse::from).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct RateListQuery {
    pub currency: Option<String>,
    pub provider: Option<String>,
    /// `best` orders by rate descending
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

/// List rates, optionally filtered by currency and provider
async fn list_rates(
    State(state): State<AppState>,
    Query(params): Query<RateListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let currency = params.currency.as_deref().map(parse_currency).transpose()?;

    let best_first = match params.sort.as_deref() {
        None => false,
        Some(sort) if sort.eq_ignore_ascii_case("best") => true,
        Some(other) => {
            return Err(ServiceError::InvalidInput(format!(
                "Unsupported sort '{}'; expected 'best'",
                other
            )))
        }
    };

    let filter = RateFilter {
        currency: currency.map(|c| c.code().to_string()),
        provider: params.provider,
        best_first,
    };

    let rates = state.rates.list(filter).await?;
    Ok(success_response(to_responses(rates)))
}

/// Rates ordered best first
async fn best_rates(
    State(state): State<AppState>,
    Query(params): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let currency = params.currency.as_deref().map(parse_currency).transpose()?;

    let rates = state
        .rates
        .best_rates(currency.as_ref().map(Currency::code))
        .await?;

    Ok(success_response(to_responses(rates)))
}

/// Create a new rate
async fn create_rate(
    State(state): State<AppState>,
    payload: Result<Json<NewRate>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let model = state.rates.create(parse_json(payload)?).await?;

    info!("Rate created: {}", model.id);

    Ok(created_response(RateResponse::from(model)))
}

/// Get a rate by ID
async fn get_rate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let model = state.rates.get(id).await?;
    Ok(success_response(RateResponse::from(model)))
}

/// Update the supplied fields of a rate
async fn update_rate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    patch: Result<Json<RatePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let model = state.rates.update(id, parse_json(patch)?).await?;

    info!("Rate updated: {}", id);

    Ok(success_response(RateResponse::from(model)))
}

/// Delete a rate
async fn delete_rate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.rates.delete(id).await?;

    info!("Rate deleted: {}", id);

    Ok(no_content_response())
}

/// Compare every provider's quote for a currency
async fn compare_rates(
    State(state): State<AppState>,
    Path(currency): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let currency = parse_currency(&currency)?;

    let response = match state.comparisons.compare(currency.code()).await? {
        ComparisonOutcome::Found(comparison) => {
            (StatusCode::OK, Json(ApiResponse::success(comparison)))
        }
        ComparisonOutcome::NoRates { message, .. } => {
            (StatusCode::NOT_FOUND, Json(ApiResponse::error(message)))
        }
    };

    Ok(response)
}

/// Supported currency codes
async fn list_currencies() -> impl IntoResponse {
    success_response(json!({ "currencies": Currency::codes() }))
}

/// Creates the router for rate endpoints
pub fn rate_routes() -> Router<AppState> {
    Router::new()
        .route("/rates", get(list_rates).post(create_rate))
        .route("/rates/best", get(best_rates))
        .route("/rates/compare/:currency", get(compare_rates))
        .route(
            "/rates/:id",
            get(get_rate)
                .put(update_rate)
                .patch(update_rate)
                .delete(delete_rate),
        )
        .route("/currencies", get(list_currencies))
}
