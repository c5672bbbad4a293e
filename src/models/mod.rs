// ============================================================================
// Module : models
// ============================================================================
// Structures de données de la session : chandelles, prévisions, statut de
// connexion et horizon sélectionné
// ============================================================================

pub mod forecast;  // Prévisions par modèle (ForecastBundle)
pub mod horizon;   // Horizon de prévision sélectionnable
pub mod price_bar; // Chandelle OHLC historique
pub mod status;    // Statut de connexion + réponse /ping

// Re-export des structures principales pour simplifier les imports
pub use forecast::{forecast_step, ForecastBundle, ForecastModel};
pub use horizon::Horizon;
pub use price_bar::PriceBar;
pub use status::{ConnectionStatus, Health};
