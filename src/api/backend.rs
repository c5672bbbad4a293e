// ============================================================================
// Trait : Backend
// ============================================================================
// Interface abstraite des opérations du backend
//
// CONCEPT RUST : async_trait
// - Les méthodes async d'un trait retournent des Futures de types différents
// - async_trait les "boxe" pour rendre le trait object-safe
// - Permet Arc<dyn Backend> : le worker ne connaît pas l'implémentation
//   (ApiClient en production, faux backend scripté dans les tests)
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::num::NonZeroU32;

use crate::api::ApiError;
use crate::models::{ForecastBundle, Health, Horizon, PriceBar};

/// Accusé de réception de POST /ingest
///
/// Le contenu est défini par le backend ; seul le succès HTTP compte.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub status: Option<String>,

    /// Nombre de lignes insérées (type libre côté backend)
    #[serde(default)]
    pub inserted: Option<serde_json::Value>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Opérations exposées par le backend de prévision
///
/// Chaque appel = exactement un aller-retour HTTP : pas de cache, pas de retry.
#[async_trait]
pub trait Backend: Send + Sync {
    /// GET /ping
    async fn check_health(&self) -> Result<Health, ApiError>;

    /// GET /historical?limit=N : les N chandelles les plus récentes, triées
    /// par timestamp croissant
    async fn fetch_historical(&self, limit: NonZeroU32) -> Result<Vec<PriceBar>, ApiError>;

    /// POST /ingest {start, end} : (ré)ingestion de la plage fermée [start, end]
    async fn trigger_ingestion(&self, start: NaiveDate, end: NaiveDate) -> Result<IngestAck, ApiError>;

    /// POST /forecast {horizon} : prévisions de chaque modèle
    async fn request_forecast(&self, horizon: Horizon) -> Result<ForecastBundle, ApiError>;
}
