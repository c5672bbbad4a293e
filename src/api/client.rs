// ============================================================================
// API Client : backend de prévision Bitcoin
// ============================================================================
// Traduit les opérations du backend en appels HTTP typés
//
// CONCEPTS RUST :
// 1. async/await : appels non-bloquants
// 2. Result<T, ApiError> : taxonomie d'erreurs typée (thiserror)
// 3. Serde : désérialisation JSON, normalisation de l'enveloppe {data: [...]}
// ============================================================================

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ApiError, Backend, IngestAck};
use crate::models::forecast::RawPredictions;
use crate::models::price_bar::parse_timestamp;
use crate::models::{ForecastBundle, Health, Horizon, PriceBar};

/// Format des dates envoyées à /ingest
const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================

/// Une chandelle telle que stockée par le backend
///
/// Les champs supplémentaires (volume, indicateurs, sentiment...) sont ignorés.
/// L'ingestion actuelle stocke les colonnes avec majuscule ("Date", "Open"...)
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
}

impl RawBar {
    fn into_bar(self) -> Result<PriceBar, ApiError> {
        let timestamp = parse_timestamp(&self.date)
            .ok_or_else(|| ApiError::Payload(format!("date invalide : {:?}", self.date)))?;
        Ok(PriceBar::new(timestamp, self.open, self.high, self.low, self.close))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP du backend
///
/// CONCEPT : reqwest::Client est un pool de connexions
/// - Créé une seule fois, cloné à bas coût (Arc interne)
/// - Le timeout s'applique à chaque requête
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Crée un client pour l'URL de base donnée (ex: "http://127.0.0.1:5000/api")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL de base (sans slash final)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Construit l'URL complète d'un endpoint
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Lit le corps de la réponse et vérifie le statut HTTP
    ///
    /// Le corps est lu dans tous les cas pour garder le message d'erreur du backend.
    async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let body = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "Backend returned error status");
            return Err(ApiError::http(status, &body));
        }

        Ok(body)
    }
}

#[async_trait]
impl Backend for ApiClient {
    #[instrument(skip(self))]
    async fn check_health(&self) -> Result<Health, ApiError> {
        let response = self.http.get(self.url("ping")).send().await?;
        let body = Self::read_body(response).await?;
        let health: Health = serde_json::from_str(&body)?;

        debug!(status = %health.status, version = ?health.version, "Health check completed");
        Ok(health)
    }

    #[instrument(skip(self))]
    async fn fetch_historical(&self, limit: NonZeroU32) -> Result<Vec<PriceBar>, ApiError> {
        let response = self
            .http
            .get(self.url("historical"))
            .query(&[("limit", limit.get())])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let bars = parse_historical(&body)?;

        info!(bars = bars.len(), "Fetched historical data");
        Ok(bars)
    }

    #[instrument(skip(self), fields(start = %start, end = %end))]
    async fn trigger_ingestion(&self, start: NaiveDate, end: NaiveDate) -> Result<IngestAck, ApiError> {
        let payload = json!({
            "start": start.format(DATE_FORMAT).to_string(),
            "end": end.format(DATE_FORMAT).to_string(),
        });

        let response = self.http.post(self.url("ingest")).json(&payload).send().await?;
        let body = Self::read_body(response).await?;

        // Accusé de réception libre : un corps inattendu n'est pas une erreur
        let ack = match serde_json::from_str::<IngestAck>(&body) {
            Ok(ack) => ack,
            Err(e) => {
                warn!(error = %e, "Unrecognized ingestion acknowledgement, ignoring body");
                IngestAck::default()
            }
        };

        info!(status = ?ack.status, inserted = ?ack.inserted, "Ingestion acknowledged");
        Ok(ack)
    }

    #[instrument(skip(self), fields(horizon = horizon.hours()))]
    async fn request_forecast(&self, horizon: Horizon) -> Result<ForecastBundle, ApiError> {
        let payload = json!({ "horizon": horizon.hours() });

        let response = self.http.post(self.url("forecast")).json(&payload).send().await?;
        let body = Self::read_body(response).await?;
        let bundle = parse_forecast(&body)?;

        info!(models = bundle.series.len(), "Forecast received");
        Ok(bundle)
    }
}

// ============================================================================
// Normalisation des réponses
// ============================================================================

/// Parse la réponse de /historical
///
/// CONCEPT : Normalisation à la frontière
/// - Le backend renvoie soit un tableau nu, soit {ticker, count, data: [...]}
/// - Les composants en aval ne voient que Vec<PriceBar>
/// - Le backend trie du plus récent au plus ancien : on retrie en croissant
pub fn parse_historical(body: &str) -> Result<Vec<PriceBar>, ApiError> {
    let value: Value = serde_json::from_str(body)?;

    let rows = match value {
        Value::Array(_) => value,
        Value::Object(mut envelope) => envelope
            .remove("data")
            .ok_or_else(|| ApiError::Payload("champ `data` absent de la réponse".to_string()))?,
        other => {
            return Err(ApiError::Payload(format!(
                "attendu un tableau ou {{\"data\": [...]}}, reçu : {other}"
            )))
        }
    };

    let raw: Vec<RawBar> = serde_json::from_value(rows)?;
    let mut bars = raw
        .into_iter()
        .map(RawBar::into_bar)
        .collect::<Result<Vec<_>, _>>()?;

    // Tri stable : l'ordre relatif des timestamps égaux est conservé
    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

/// Parse la réponse de /forecast ({predictions: {...}} ou prédictions nues)
pub fn parse_forecast(body: &str) -> Result<ForecastBundle, ApiError> {
    let value: Value = serde_json::from_str(body)?;

    let predictions = match value {
        Value::Object(mut envelope) if envelope.contains_key("predictions") => {
            envelope.remove("predictions").unwrap_or(Value::Null)
        }
        other => other,
    };

    let raw: RawPredictions = serde_json::from_value(predictions)?;
    ForecastBundle::try_from(raw).map_err(ApiError::Payload)
}

// ============================================================================
// Tests unitaires
// ============================================================================
