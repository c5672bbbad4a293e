// ============================================================================
// Tests d'intégration : ApiClient contre un faux backend HTTP (axum)
// ============================================================================

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};

use btc_dashboard::api::{ApiClient, ApiError, Backend};
use btc_dashboard::models::{ForecastModel, Horizon};

/// Sert le router sur un port libre et retourne l'URL de base de l'API
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn limit(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

/// Chandelles du plus récent au plus ancien, comme le backend
fn rows() -> Vec<Value> {
    (1..=5)
        .rev()
        .map(|day| {
            json!({
                "date": format!("2025-09-0{}T00:00:00", day),
                "open": 100.0 + day as f64,
                "high": 110.0 + day as f64,
                "low": 90.0 + day as f64,
                "close": 105.0 + day as f64,
                "volume": 1234.5
            })
        })
        .collect()
}

async fn historical_envelope(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(100);
    let data: Vec<Value> = rows().into_iter().take(limit).collect();
    Json(json!({ "ticker": "BTC-USD", "count": data.len(), "data": data }))
}

#[tokio::test]
async fn test_check_health() {
    let router = Router::new().route(
        "/api/ping",
        get(|| async { Json(json!({ "status": "ok", "version": "2.1.0" })) }),
    );
    let base_url = serve(router).await;

    let health = client(&base_url).check_health().await.unwrap();

    assert!(health.is_ok());
    assert_eq!(health.version.as_deref(), Some("2.1.0"));
}

#[tokio::test]
async fn test_fetch_historical_envelope_respects_limit_and_sorts() {
    let router = Router::new().route("/api/historical", get(historical_envelope));
    let base_url = serve(router).await;

    let bars = client(&base_url).fetch_historical(limit(3)).await.unwrap();

    // Les 3 plus récentes (3, 4, 5 septembre), en ordre croissant
    let days: Vec<u32> = bars.iter().map(|b| b.timestamp.day()).collect();
    assert_eq!(days, vec![3, 4, 5]);
    assert_eq!(bars[2].close, 110.0);
}

#[tokio::test]
async fn test_fetch_historical_bare_array() {
    let router = Router::new().route("/api/historical", get(|| async { Json(Value::Array(rows())) }));
    let base_url = serve(router).await;

    let bars = client(&base_url).fetch_historical(limit(20)).await.unwrap();

    assert_eq!(bars.len(), 5);
    assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[tokio::test]
async fn test_trigger_ingestion_sends_date_range() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route(
            "/api/ingest",
            post(
                |State(received): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *received.lock().unwrap() = Some(body);
                    Json(json!({ "status": "success", "inserted": 12 }))
                },
            ),
        )
        .with_state(Arc::clone(&received));
    let base_url = serve(router).await;

    let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
    let ack = client(&base_url).trigger_ingestion(start, end).await.unwrap();

    assert_eq!(ack.status.as_deref(), Some("success"));
    assert_eq!(
        received.lock().unwrap().clone(),
        Some(json!({ "start": "2025-09-01", "end": "2025-09-15" }))
    );
}

#[tokio::test]
async fn test_request_forecast() {
    let router = Router::new().route(
        "/api/forecast",
        post(|Json(body): Json<Value>| async move {
            let horizon = body["horizon"].as_u64().unwrap_or(0) as usize;
            let values: Vec<f64> = (0..horizon).map(|i| 100.0 + i as f64).collect();
            Json(json!({
                "message": "Forecast generated successfully",
                "horizon": horizon,
                "predictions": {
                    "moving_average": values,
                    "arima": values,
                    "gru": null,
                    "ensemble": values
                }
            }))
        }),
    );
    let base_url = serve(router).await;

    let bundle = client(&base_url).request_forecast(Horizon::H3).await.unwrap();

    assert_eq!(bundle.reference_len(), 3);
    assert!(bundle.get(ForecastModel::Gru).is_none());
    assert_eq!(bundle.get(ForecastModel::Arima), Some(&[100.0, 101.0, 102.0][..]));
}

#[tokio::test]
async fn test_non_2xx_is_http_error() {
    let router = Router::new().route(
        "/api/ingest",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "ingestion pipeline crashed") }),
    );
    let base_url = serve(router).await;

    let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let err = client(&base_url).trigger_ingestion(start, start).await.unwrap_err();

    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("crashed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_payload_is_payload_error() {
    let router = Router::new().route(
        "/api/historical",
        get(|| async { Json(json!({ "data": [{ "date": "2025-09-01", "close": 1.0 }] })) }),
    );
    let base_url = serve(router).await;

    let err = client(&base_url).fetch_historical(limit(20)).await.unwrap_err();

    assert!(matches!(err, ApiError::Payload(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Port réservé puis libéré : plus personne n'écoute
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/api", addr)).check_health().await.unwrap_err();

    assert!(err.is_network());
}
