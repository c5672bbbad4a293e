// ============================================================================
// Configuration
// ============================================================================
// Paramètres de la session, lus depuis la ligne de commande (clap)
//
// Tout a une valeur par défaut : `btc-dashboard` sans argument se connecte à
// un backend local sur le port 5000.
// ============================================================================

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

/// URL de base par défaut du backend
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Nombre de chandelles demandées à /historical
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Intervalle du health check périodique (secondes)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Début fixe de la plage d'ingestion
pub const DEFAULT_INGEST_START: &str = "2025-09-01";

/// Dashboard terminal pour l'historique et les prévisions du Bitcoin
#[derive(Debug, Clone, Parser)]
#[command(name = "btc-dashboard", version)]
pub struct Config {
    /// URL de base de l'API du backend
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Nombre de chandelles récentes à afficher
    #[arg(long, default_value_t = NonZeroU32::new(DEFAULT_HISTORY_LIMIT).unwrap_or(NonZeroU32::MIN))]
    pub history_limit: NonZeroU32,

    /// Intervalle entre deux health checks, en secondes
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: u64,

    /// Date de début (YYYY-MM-DD) envoyée lors d'un refresh ; la fin est aujourd'hui
    #[arg(long, default_value = DEFAULT_INGEST_START)]
    pub ingest_start: NaiveDate,

    /// Timeout de chaque requête HTTP, en secondes
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    /// Répertoire des logs (défaut : répertoire de données local de l'utilisateur)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Répertoire des logs effectif
    ///
    /// Linux : ~/.local/share/btc-dashboard/logs, ./logs en dernier recours.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join("btc-dashboard").join("logs"))
                .unwrap_or_else(|| PathBuf::from("./logs"))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["btc-dashboard"])
    }
}
