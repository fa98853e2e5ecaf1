//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use mgce::analysis::analyze;
use mgce::api::{AppState, router};

use common::{reference_input, reference_json, reference_rates};

fn build_api_state() -> Arc<AppState> {
    Arc::new(AppState {
        rates: reference_rates(),
    })
}

async fn read_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn analyze_matches_library_result() {
    let app = router(build_api_state());
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(reference_json()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = read_json(resp).await;
    let expected = analyze(&reference_input(), &reference_rates()).unwrap();
    assert_eq!(json["design"]["battery_kwh"], expected.design.battery_kwh);
    assert_eq!(json["design"]["generator_kw"], expected.design.generator_kw);
    let npv = json["financial"]["npv"].as_f64().unwrap();
    assert!((npv - expected.financial.npv).abs() < 1e-3);
    assert_eq!(
        json["recommendations"],
        serde_json::to_value(&expected.recommendations).unwrap()
    );
}

#[tokio::test]
async fn undefined_metrics_serialize_as_null() {
    let mut input = reference_input();
    input.include_solar = false;
    input.include_battery = false;
    let app = router(build_api_state());
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&input).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = read_json(resp).await;
    assert!(json["financial"]["simple_payback_years"].is_null());
    assert!(json["financial"]["irr"].is_null());
    assert!(json["financial"]["lcoe"].is_null());
}

#[tokio::test]
async fn unknown_request_field_is_rejected() {
    let app = router(build_api_state());
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"facility_type":"commercial","peak_demand_kw":500,"annual_consumption_kwh":1,"wind_kw":10}"#,
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rates_lists_every_location() {
    let app = router(build_api_state());
    let req = Request::builder()
        .uri("/rates")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = read_json(resp).await;
    let keys: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        [
            "baton_rouge",
            "lafayette",
            "lake_charles",
            "new_orleans",
            "shreveport"
        ]
    );
}
