// ============================================================================
// Worker : exécution des appels au backend en arrière-plan
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - Le contrôleur (App) produit des AppCommand
// - Le worker exécute chaque commande dans une tâche tokio
// - Les résultats reviennent sous forme d'AppResult via un channel mpsc
// - L'event loop les applique à App dans l'ordre d'arrivée
//
// Le Poller est une tâche périodique (health check) dont la durée de vie est
// liée à une valeur : quand le Poller est drop, la tâche est annulée.
// ============================================================================

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{ApiError, Backend};
use crate::models::{ForecastBundle, Health, Horizon, PriceBar};

// ============================================================================
// Commandes et résultats
// ============================================================================

/// Commandes envoyées au worker
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Démarrage : health check puis, si le backend répond "ok", historique
    Mount { limit: NonZeroU32 },

    /// Refresh : ingestion de [start, end] puis rechargement de l'historique
    Refresh {
        start: NaiveDate,
        end: NaiveDate,
        limit: NonZeroU32,
    },

    /// Prévisions pour l'horizon sélectionné
    Forecast { horizon: Horizon },
}

/// Étape du refresh qui a échoué
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("échec de l'ingestion : {0}")]
    Ingest(#[source] ApiError),

    #[error("échec du rechargement de l'historique : {0}")]
    Fetch(#[source] ApiError),
}

/// Résultats renvoyés par le worker et le poller
#[derive(Debug)]
pub enum AppResult {
    /// Health check (poll périodique ou premier appel du Mount)
    Health(Result<Health, ApiError>),

    /// Historique initial, envoyé seulement si le health check du Mount
    /// (déjà livré comme Health) a répondu "ok"
    Mounted(Result<Vec<PriceBar>, ApiError>),

    /// Fin d'un refresh (ingestion + rechargement)
    Refreshed(Result<Vec<PriceBar>, RefreshError>),

    /// Prévisions reçues (ou échec) pour un horizon
    Forecasted {
        horizon: Horizon,
        result: Result<ForecastBundle, ApiError>,
    },
}

// ============================================================================
// Exécution
// ============================================================================

/// Exécute une commande contre le backend et envoie ses résultats
///
/// CONCEPT : Points de suspension ordonnés
/// - Chaque .await termine avant que l'appel suivant ne commence
/// - Refresh : le fetch ne part qu'après le succès de l'ingestion
/// - Mount : le health check est envoyé dès qu'il termine, sans attendre
///   l'historique ; un poll plus récent ne peut pas être écrasé par lui
pub async fn execute(backend: &dyn Backend, command: AppCommand, results: &UnboundedSender<AppResult>) {
    match command {
        AppCommand::Mount { limit } => {
            let health = backend.check_health().await;

            let fetch = match &health {
                Ok(h) if h.is_ok() => true,
                Ok(h) => {
                    warn!(status = %h.status, "Backend answered with a non-ok status, skipping initial fetch");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Backend unreachable at startup");
                    false
                }
            };

            if !send(results, AppResult::Health(health)) || !fetch {
                return;
            }

            send(results, AppResult::Mounted(backend.fetch_historical(limit).await));
        }

        AppCommand::Refresh { start, end, limit } => {
            send(results, AppResult::Refreshed(refresh(backend, start, end, limit).await));
        }

        AppCommand::Forecast { horizon } => {
            let result = backend.request_forecast(horizon).await;
            send(results, AppResult::Forecasted { horizon, result });
        }
    }
}

/// Envoie un résultat ; false si l'event loop n'écoute plus
fn send(results: &UnboundedSender<AppResult>, result: AppResult) -> bool {
    if results.send(result).is_err() {
        debug!("Result channel closed, dropping result");
        return false;
    }
    true
}

/// Ingestion puis rechargement, strictement dans cet ordre
async fn refresh(
    backend: &dyn Backend,
    start: NaiveDate,
    end: NaiveDate,
    limit: NonZeroU32,
) -> Result<Vec<PriceBar>, RefreshError> {
    let ack = backend
        .trigger_ingestion(start, end)
        .await
        .map_err(RefreshError::Ingest)?;
    debug!(?ack, "Ingestion done, reloading historical data");

    backend
        .fetch_historical(limit)
        .await
        .map_err(RefreshError::Fetch)
}

/// Exécute les commandes dans des tâches tokio
///
/// CONCEPT : Une tâche par commande
/// - Un refresh lent ne bloque ni l'UI ni le health check
/// - Les résultats arrivent dans l'ordre où les tâches se terminent
pub struct Worker {
    backend: Arc<dyn Backend>,
    results: UnboundedSender<AppResult>,
    runtime: Handle,
}

impl Worker {
    pub fn new(runtime: Handle, backend: Arc<dyn Backend>, results: UnboundedSender<AppResult>) -> Self {
        Self {
            backend,
            results,
            runtime,
        }
    }

    /// Lance une commande en arrière-plan
    pub fn dispatch(&self, command: AppCommand) {
        info!(?command, "Dispatching command");

        let backend = Arc::clone(&self.backend);
        let results = self.results.clone();

        self.runtime.spawn(async move {
            execute(backend.as_ref(), command, &results).await;
        });
    }
}

// ============================================================================
// Poller : health check périodique
// ============================================================================

/// Tâche de health check périodique
///
/// CONCEPT RUST : RAII
/// - start() lance la tâche, la valeur retournée la possède
/// - Drop annule la tâche : impossible de la laisser tourner après la vue
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Démarre le polling ; le premier tick a lieu après `period`
    /// (le health check initial fait partie du Mount)
    pub fn start(
        runtime: &Handle,
        backend: Arc<dyn Backend>,
        period: Duration,
        results: UnboundedSender<AppResult>,
    ) -> Self {
        info!(period_secs = period.as_secs_f64(), "Starting health poller");

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let health = backend.check_health().await;
                if !send(&results, AppResult::Health(health)) {
                    debug!("Poller exiting");
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Arrête le polling
    pub fn stop(self) {
        info!("Stopping health poller");
        // Drop fait le travail
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
