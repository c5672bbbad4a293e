// ============================================================================
// Module : api
// ============================================================================
// Client du backend de prévision : health check, historique, ingestion,
// prévisions. Toutes les routes vivent sous une même URL de base (/api).
// ============================================================================

pub mod backend; // Trait Backend (abstraction testable)
pub mod client;  // Implémentation HTTP (reqwest)
pub mod error;   // Taxonomie des erreurs

// Re-export des types principaux
pub use backend::{Backend, IngestAck};
pub use client::ApiClient;
pub use error::ApiError;
