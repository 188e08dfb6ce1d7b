#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use remit_rates::{
    config::AppConfig,
    db::{self, DbPool},
    entities::rate,
    services::rates::{NewRate, RateService},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

/// Fresh in-memory SQLite database with the schema applied.
pub async fn test_db() -> Arc<DbPool> {
    let pool = db::connect_in_memory()
        .await
        .expect("failed to create in-memory test database");
    Arc::new(pool)
}

pub fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

pub async fn test_state() -> AppState {
    AppState::new(test_db().await, test_config())
}

pub async fn seed(service: &RateService, provider: &str, rate: Decimal, currency: &str) -> rate::Model {
    service
        .create(NewRate::new(provider, rate, currency))
        .await
        .expect("seed rate should be valid")
}

/// Helper harness for driving the HTTP router without binding a socket.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let state = test_state().await;
        Self {
            router: remit_rates::app_router(state.clone()),
            state,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
