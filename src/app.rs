// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état de la session du dashboard
//
// CONCEPTS RUST :
// 1. State Management : tout l'état de la vue dans une seule structure
// 2. Mutabilité contrôlée : seul l'event loop possède un &mut App
// 3. Encapsulation : champs privés, accès via méthodes publiques
//
// PATTERN : Contrôleur pur
// - Les événements utilisateur produisent des AppCommand (sans I/O)
// - Les résultats du worker sont appliqués via apply(AppResult)
// - Aucune méthode ne fait d'appel réseau : tout est testable sans backend
// ============================================================================

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::config::Config;
use crate::models::{ConnectionStatus, ForecastBundle, Health, Horizon, PriceBar};
use crate::worker::{AppCommand, AppResult};

/// Durée de vie d'une notification d'information
const NOTIFICATION_TTL: Duration = Duration::from_secs(6);

// ============================================================================
// Notifications
// ============================================================================

/// Gravité d'une notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Message affiché dans le footer
///
/// Les infos expirent après NOTIFICATION_TTL, les erreurs restent jusqu'à Esc
/// ou jusqu'à la notification suivante.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: Instant,
}

impl Notification {
    fn is_expired(&self, now: Instant) -> bool {
        self.level == NotificationLevel::Info
            && now.saturating_duration_since(self.raised_at) >= NOTIFICATION_TTL
    }
}

// ============================================================================
// App
// ============================================================================

/// État de la session
pub struct App {
    /// Indique si l'application doit continuer à tourner
    running: bool,

    /// Two-step quit : première pression de 'q' = confirmation demandée
    confirm_quit: bool,

    /// Chandelles affichées, triées par timestamp croissant
    bars: Vec<PriceBar>,

    /// Date de la dernière mise à jour réussie de `bars`
    last_updated: Option<DateTime<Utc>>,

    forecast: Option<ForecastBundle>,

    /// Horizon des prévisions affichées (peut différer de la sélection courante)
    forecast_horizon: Option<Horizon>,

    status: ConnectionStatus,

    /// Version annoncée par /ping
    backend_version: Option<String>,

    horizon: Horizon,

    /// CONCEPT : Garde de concurrence
    /// - true pendant un refresh ou une demande de prévisions
    /// - toute nouvelle demande est rejetée (pas de file d'attente)
    loading: bool,
    loading_message: Option<String>,

    notification: Option<Notification>,

    history_limit: NonZeroU32,
    ingest_start: NaiveDate,
}

impl App {
    /// Crée l'état initial : statut inconnu, aucune donnée, horizon 24h
    pub fn new(history_limit: NonZeroU32, ingest_start: NaiveDate) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            bars: Vec::new(),
            last_updated: None,
            forecast: None,
            forecast_horizon: None,
            status: ConnectionStatus::Unknown,
            backend_version: None,
            horizon: Horizon::default(),
            loading: false,
            loading_message: None,
            notification: None,
            history_limit,
            ingest_start,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.history_limit, config.ingest_start)
    }

    // ========================================================================
    // Lecture
    // ========================================================================

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn forecast(&self) -> Option<&ForecastBundle> {
        self.forecast.as_ref()
    }

    pub fn forecast_horizon(&self) -> Option<Horizon> {
        self.forecast_horizon
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn backend_version(&self) -> Option<&str> {
        self.backend_version.as_deref()
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loading_message(&self) -> Option<&str> {
        self.loading_message.as_deref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    // ========================================================================
    // Événements utilisateur
    // ========================================================================

    /// Commande de démarrage (health check puis historique)
    pub fn mount(&self) -> AppCommand {
        info!(limit = self.history_limit.get(), "Mounting dashboard");
        AppCommand::Mount {
            limit: self.history_limit,
        }
    }

    /// Change l'horizon sélectionné ; aucun appel réseau
    pub fn select_horizon(&mut self, horizon: Horizon) {
        if self.horizon != horizon {
            debug!(from = self.horizon.hours(), to = horizon.hours(), "Horizon changed");
        }
        self.horizon = horizon;
    }

    pub fn next_horizon(&mut self) {
        self.select_horizon(self.horizon.next());
    }

    pub fn previous_horizon(&mut self) {
        self.select_horizon(self.horizon.previous());
    }

    /// Demande un refresh (ingestion de [ingest_start, today] puis historique)
    ///
    /// Retourne None si une opération est déjà en cours.
    pub fn request_refresh(&mut self, today: NaiveDate) -> Option<AppCommand> {
        if self.loading {
            debug!("Refresh ignored, an operation is already running");
            return None;
        }

        self.start_loading("Updating...");
        Some(AppCommand::Refresh {
            start: self.ingest_start,
            end: today,
            limit: self.history_limit,
        })
    }

    /// Demande des prévisions pour l'horizon sélectionné
    pub fn request_forecast(&mut self) -> Option<AppCommand> {
        if self.loading {
            debug!("Forecast ignored, an operation is already running");
            return None;
        }

        self.start_loading(format!("Forecasting {}...", self.horizon.label()));
        Some(AppCommand::Forecast {
            horizon: self.horizon,
        })
    }

    /// Retire les prévisions du graphique
    pub fn clear_forecast(&mut self) {
        self.forecast = None;
        self.forecast_horizon = None;
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Appelé à chaque itération de la boucle : expiration des notifications
    pub fn tick(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notification = None;
        }
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Applique un résultat du worker ou du poller
    pub fn apply(&mut self, result: AppResult) {
        match result {
            AppResult::Health(health) => self.apply_health(&health),

            // Le health check du Mount arrive avant, comme un AppResult::Health
            AppResult::Mounted(bars) => match bars {
                Ok(bars) => self.replace_bars(bars),
                Err(e) => {
                    warn!(error = %e, "Initial historical fetch failed");
                    self.status = ConnectionStatus::Unreachable;
                }
            },

            AppResult::Refreshed(outcome) => {
                match outcome {
                    Ok(bars) => {
                        self.replace_bars(bars);
                        self.notify(NotificationLevel::Info, "Data updated");
                    }
                    Err(e) => {
                        warn!(error = %e, "Refresh failed");
                        self.notify(NotificationLevel::Error, format!("Error updating data: {e}"));
                    }
                }
                self.stop_loading();
            }

            AppResult::Forecasted { horizon, result } => {
                match result {
                    Ok(bundle) => {
                        info!(horizon = horizon.hours(), points = bundle.reference_len(), "Forecast stored");
                        self.forecast = Some(bundle);
                        self.forecast_horizon = Some(horizon);
                    }
                    Err(e) => {
                        warn!(error = %e, "Forecast failed");
                        self.notify(NotificationLevel::Error, format!("Error generating forecast: {e}"));
                    }
                }
                self.stop_loading();
            }
        }
    }

    /// Machine d'état du statut de connexion
    fn apply_health(&mut self, health: &Result<Health, ApiError>) {
        let next = match health {
            Ok(h) if h.is_ok() => {
                self.backend_version = h.version.clone();
                ConnectionStatus::Connected
            }
            Ok(h) => {
                debug!(status = %h.status, "Backend reported a non-ok status");
                ConnectionStatus::Unreachable
            }
            Err(e) => {
                debug!(error = %e, "Health check failed");
                ConnectionStatus::Unreachable
            }
        };

        if next != self.status {
            info!(from = ?self.status, to = ?next, "Connection status changed");
        }
        self.status = next;
    }

    fn replace_bars(&mut self, bars: Vec<PriceBar>) {
        self.bars = bars;
        self.last_updated = Some(Utc::now());
    }

    fn start_loading(&mut self, message: impl Into<String>) {
        self.loading = true;
        self.loading_message = Some(message.into());
    }

    fn stop_loading(&mut self) {
        self.loading = false;
        self.loading_message = None;
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notification = Some(Notification {
            level,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }
}

impl Default for App {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastModel;
    use crate::worker::RefreshError;
    use chrono::TimeZone;
    use reqwest::StatusCode;

    fn ok_health() -> Result<Health, ApiError> {
        Ok(Health {
            status: "ok".to_string(),
            version: Some("1.2.0".to_string()),
        })
    }

    fn down() -> ApiError {
        ApiError::http(StatusCode::SERVICE_UNAVAILABLE, "down")
    }

    fn bars(count: u32) -> Vec<PriceBar> {
        (1..=count)
            .map(|day| {
                let ts = Utc.with_ymd_and_hms(2025, 9, day, 0, 0, 0).unwrap();
                PriceBar::new(ts, 100.0, 110.0, 90.0, 105.0)
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let app = App::default();
        assert!(app.is_running());
        assert_eq!(app.status(), ConnectionStatus::Unknown);
        assert!(app.bars().is_empty());
        assert!(!app.is_loading());
        assert_eq!(app.horizon(), Horizon::H24);
        assert!(app.forecast().is_none());
    }

    #[test]
    fn test_mount_command_uses_history_limit() {
        let app = App::new(NonZeroU32::new(50).unwrap(), today());
        assert_eq!(
            app.mount(),
            AppCommand::Mount {
                limit: NonZeroU32::new(50).unwrap()
            }
        );
    }

    #[test]
    fn test_mount_success_populates_bars() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Mounted(Ok(bars(3))));

        assert_eq!(app.status(), ConnectionStatus::Connected);
        assert_eq!(app.bars().len(), 3);
        assert_eq!(app.backend_version(), Some("1.2.0"));
        assert!(app.last_updated().is_some());
    }

    #[test]
    fn test_mount_with_failed_fetch_is_unreachable() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Mounted(Err(down())));

        assert_eq!(app.status(), ConnectionStatus::Unreachable);
        assert!(app.bars().is_empty());
    }

    #[test]
    fn test_late_mount_bars_keep_newer_failed_poll() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Health(Err(down())));

        app.apply(AppResult::Mounted(Ok(bars(3))));

        assert_eq!(app.status(), ConnectionStatus::Unreachable);
        assert_eq!(app.bars().len(), 3);
    }

    #[test]
    fn test_non_ok_health_is_unreachable() {
        let mut app = App::default();
        app.apply(AppResult::Health(Ok(Health {
            status: "degraded".to_string(),
            version: None,
        })));
        assert_eq!(app.status(), ConnectionStatus::Unreachable);
    }

    #[test]
    fn test_status_transitions() {
        let mut app = App::default();

        app.apply(AppResult::Health(ok_health()));
        assert_eq!(app.status(), ConnectionStatus::Connected);

        app.apply(AppResult::Health(Err(down())));
        assert_eq!(app.status(), ConnectionStatus::Unreachable);

        app.apply(AppResult::Health(ok_health()));
        assert_eq!(app.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_health_failure_keeps_bars() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Mounted(Ok(bars(2))));

        app.apply(AppResult::Health(Err(down())));

        assert_eq!(app.status(), ConnectionStatus::Unreachable);
        assert_eq!(app.bars().len(), 2);
    }

    #[test]
    fn test_refresh_is_rejected_while_loading() {
        let mut app = App::default();

        let first = app.request_refresh(today());
        assert!(matches!(first, Some(AppCommand::Refresh { .. })));
        assert!(app.is_loading());

        assert!(app.request_refresh(today()).is_none());
        assert!(app.request_forecast().is_none());
    }

    #[test]
    fn test_refresh_uses_fixed_start_and_today() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let mut app = App::new(NonZeroU32::new(20).unwrap(), start);

        assert_eq!(
            app.request_refresh(today()),
            Some(AppCommand::Refresh {
                start,
                end: today(),
                limit: NonZeroU32::new(20).unwrap(),
            })
        );
    }

    #[test]
    fn test_refresh_success_replaces_bars_and_clears_loading() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Mounted(Ok(bars(2))));
        app.request_refresh(today());

        app.apply(AppResult::Refreshed(Ok(bars(5))));

        assert_eq!(app.bars().len(), 5);
        assert!(!app.is_loading());
        assert_eq!(app.notification().unwrap().level, NotificationLevel::Info);
    }

    #[test]
    fn test_refresh_failure_keeps_bars_and_notifies() {
        let mut app = App::default();
        app.apply(AppResult::Health(ok_health()));
        app.apply(AppResult::Mounted(Ok(bars(2))));
        let before = app.bars().to_vec();
        app.request_refresh(today());

        app.apply(AppResult::Refreshed(Err(RefreshError::Ingest(down()))));

        assert_eq!(app.bars(), before.as_slice());
        assert!(!app.is_loading());
        let notification = app.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.starts_with("Error updating data"));

        // Un nouveau refresh est de nouveau accepté
        assert!(app.request_refresh(today()).is_some());
    }

    #[test]
    fn test_horizon_change_produces_no_command() {
        let mut app = App::default();
        app.next_horizon();
        assert_eq!(app.horizon(), Horizon::H72);
        app.select_horizon(Horizon::H1);
        assert_eq!(app.horizon(), Horizon::H1);
        app.previous_horizon();
        assert_eq!(app.horizon(), Horizon::H72);
        assert!(!app.is_loading());
    }

    #[test]
    fn test_forecast_flow() {
        let mut app = App::default();
        app.select_horizon(Horizon::H3);

        assert_eq!(
            app.request_forecast(),
            Some(AppCommand::Forecast { horizon: Horizon::H3 })
        );
        assert!(app.is_loading());

        let bundle = ForecastBundle::new().with_series(ForecastModel::Ensemble, vec![1.0, 2.0, 3.0]);
        app.apply(AppResult::Forecasted {
            horizon: Horizon::H3,
            result: Ok(bundle.clone()),
        });

        assert!(!app.is_loading());
        assert_eq!(app.forecast(), Some(&bundle));
        assert_eq!(app.forecast_horizon(), Some(Horizon::H3));

        app.clear_forecast();
        assert!(app.forecast().is_none());
    }

    #[test]
    fn test_forecast_failure_keeps_previous_overlay() {
        let mut app = App::default();
        let bundle = ForecastBundle::new().with_series(ForecastModel::Arima, vec![1.0]);
        app.apply(AppResult::Forecasted {
            horizon: Horizon::H24,
            result: Ok(bundle.clone()),
        });

        app.request_forecast();
        app.apply(AppResult::Forecasted {
            horizon: Horizon::H24,
            result: Err(down()),
        });

        assert_eq!(app.forecast(), Some(&bundle));
        assert_eq!(app.notification().unwrap().level, NotificationLevel::Error);
    }

    #[test]
    fn test_notifications_expire_or_dismiss() {
        let mut app = App::default();
        app.request_refresh(today());
        app.apply(AppResult::Refreshed(Ok(bars(1))));

        let raised_at = app.notification().unwrap().raised_at;
        app.tick(raised_at + Duration::from_secs(1));
        assert!(app.notification().is_some());
        app.tick(raised_at + NOTIFICATION_TTL);
        assert!(app.notification().is_none());

        app.request_refresh(today());
        app.apply(AppResult::Refreshed(Err(RefreshError::Fetch(down()))));
        let raised_at = app.notification().unwrap().raised_at;
        app.tick(raised_at + NOTIFICATION_TTL * 10);
        assert!(app.notification().is_some());

        app.dismiss_notification();
        assert!(app.notification().is_none());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::default();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }
}
