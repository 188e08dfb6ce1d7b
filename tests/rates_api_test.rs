mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn create_returns_normalized_rate() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "western union", "rate": 277.25, "currency": "pkr" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["provider"], "Western Union");
    assert_eq!(body["currency"], "PKR");
    assert_eq!(body["rate"], json!(277.25));
    assert_eq!(body["rate_display"], "277.2500 PKR");
    assert_eq!(body["rate_formatted"], "277.2500 PKR");
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn invalid_create_lists_violations() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "W", "rate": 0, "currency": "EUR" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "Provider must be between 2 and 100 characters");
    assert_eq!(errors[1], "Rate must be greater than 0");

    let (_, listed) = app.request("GET", "/api/v1/rates", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn duplicate_create_is_unprocessable() {
    let app = TestApp::new().await;
    let payload = json!({ "provider": "Wise", "rate": 280.5, "currency": "PKR" });

    let (first, _) = app.request("POST", "/api/v1/rates", Some(payload)).await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "WISE", "rate": 281, "currency": "pkr" })),
        )
        .await;
    assert_eq!(second, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"], json!(["Provider already has a rate for this currency"]));
}

#[tokio::test]
async fn get_update_and_delete_by_id() {
    let app = TestApp::new().await;
    let (_, created) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "Xoom", "rate": 279, "currency": "PKR" })),
        )
        .await;
    let uri = format!("/api/v1/rates/{}", created["id"]);

    let (status, fetched) = app.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["provider"], "Xoom");

    let (status, updated) = app
        .request("PATCH", &uri, Some(json!({ "rate": 279.987654 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rate_display"], "279.9877 PKR");
    assert_eq!(updated["provider"], "Xoom");

    let (status, _) = app.request("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    let (status, _) = app.request("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_sorts_best_first() {
    let app = TestApp::new().await;
    for (provider, rate, currency) in [
        ("Wise", 280.5, "PKR"),
        ("Remitly", 285.0, "PKR"),
        ("Wise", 83.1, "INR"),
    ] {
        let (status, _) = app
            .request(
                "POST",
                "/api/v1/rates",
                Some(json!({ "provider": provider, "rate": rate, "currency": currency })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .request("GET", "/api/v1/rates?currency=pkr&sort=best", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let providers: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["provider"].as_str().unwrap())
        .collect();
    assert_eq!(providers, ["Remitly", "Wise"]);

    let (_, by_provider) = app.request("GET", "/api/v1/rates?provider=Wise", None).await;
    assert_eq!(by_provider.as_array().unwrap().len(), 2);

    let (_, best) = app.request("GET", "/api/v1/rates/best", None).await;
    assert_eq!(best[0]["provider"], "Remitly");
    assert_eq!(best.as_array().unwrap().len(), 3);

    let (status, _) = app.request("GET", "/api/v1/rates?sort=worst", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_currency_is_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/api/v1/rates/compare/USD", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("USD"));

    let (status, _) = app.request("GET", "/api/v1/rates?currency=eur", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compare_returns_summary_envelope() {
    let app = TestApp::new().await;
    for (provider, rate) in [("Wise", 280.0), ("Remitly", 285.0), ("Xoom", 279.0)] {
        app.request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": provider, "rate": rate, "currency": "PKR" })),
        )
        .await;
    }

    let (status, body) = app.request("GET", "/api/v1/rates/compare/pkr", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["currency"], "PKR");
    assert_eq!(data["summary"]["total_providers"], 3);
    assert_eq!(data["summary"]["average_rate"], json!(281.3333));
    assert_eq!(data["summary"]["median_rate"], json!(280.0));
    assert_eq!(data["best_rate"]["provider"], "Remitly");
    assert_eq!(data["worst_rate"]["provider"], "Xoom");
    assert_eq!(data["all_rates"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn compare_without_quotes_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/api/v1/rates/compare/NPR", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No rates found for NPR");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn currencies_lists_supported_codes() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/api/v1/currencies", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["currencies"],
        json!(["PKR", "INR", "BDT", "PHP", "NPR", "LKR"])
    );
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
}

#[tokio::test]
async fn create_with_missing_fields_lists_every_violation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "rate": 0, "currency": "EUR" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"],
        json!([
            "Provider must be between 2 and 100 characters",
            "Provider can't be blank",
            "Rate must be greater than 0",
            "Currency is not included in the list (PKR, INR, BDT, PHP, NPR, LKR)"
        ])
    );

    let (status, body) = app.request("POST", "/api/v1/rates", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.contains(&json!("Rate can't be blank")));
    assert_eq!(errors.len(), 4);
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "Wise", "rate": "lots", "currency": "PKR" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().is_some());

    let (_, listed) = app.request("GET", "/api/v1/rates", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn rate_beyond_column_range_is_a_validation_failure() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/rates",
            Some(json!({ "provider": "Wise", "rate": 100000000, "currency": "PKR" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"],
        json!(["Rate must be less than or equal to 99999999.9999"])
    );
}
