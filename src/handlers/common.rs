use crate::{errors::ServiceError, models::currency::Currency};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Rejects currency codes outside the supported set before they reach a service
pub fn parse_currency(raw: &str) -> Result<Currency, ServiceError> {
    Currency::parse(raw).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "Unsupported currency '{}'; expected one of {}",
            raw.trim(),
            Currency::codes().join(", ")
        ))
    })
}

/// Unwraps a JSON body, turning malformed payloads into the standard error body
pub fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServiceError::InvalidInput(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_supported_currency_in_any_case() {
        assert_eq!(parse_currency("pkr").unwrap(), Currency::Pkr);
    }

    #[test]
    fn rejects_unsupported_currency_as_invalid_input() {
        let err = parse_currency("usd").unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(ref msg) if msg.contains("'usd'"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
