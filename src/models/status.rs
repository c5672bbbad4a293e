// ============================================================================
// Enum : ConnectionStatus
// ============================================================================
// État de la connexion au backend, recalculé à chaque health check
// ============================================================================

use serde::Deserialize;

/// État de la connexion au backend
///
/// CONCEPT : State machine
/// - Unknown → Connected : premier health check "ok"
/// - Unknown/Connected → Unreachable : échec ou statut différent de "ok"
/// - Unreachable → Connected : prochain poll réussi (pas de backoff)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Aucun health check terminé
    #[default]
    Unknown,
    /// Dernier health check : {"status": "ok"}
    Connected,
    /// Dernier health check en échec
    Unreachable,
}

impl ConnectionStatus {
    /// Label pour la barre de statut
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Checking backend...",
            ConnectionStatus::Connected => "Backend Connected",
            ConnectionStatus::Unreachable => "Backend not reachable",
        }
    }

    pub fn is_connected(&self) -> bool {
        *self == ConnectionStatus::Connected
    }
}

/// Réponse de GET /ping
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    /// "ok" quand le backend est sain
    pub status: String,

    /// Version du backend, si exposée
    #[serde(default)]
    pub version: Option<String>,
}

impl Health {
    /// Seul signal de succès consommé : status == "ok"
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_ok() {
        let health: Health = serde_json::from_str(r#"{"status": "ok", "version": "0.1"}"#).unwrap();
        assert!(health.is_ok());
        assert_eq!(health.version.as_deref(), Some("0.1"));

        let degraded: Health = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(!degraded.is_ok());
        assert!(degraded.version.is_none());
    }

    #[test]
    fn test_default_status_is_unknown() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Unknown);
        assert!(!ConnectionStatus::Unknown.is_connected());
    }
}
