// ============================================================================
// Erreurs de l'API
// ============================================================================
// Trois familles d'échec, traitées uniformément par le contrôleur :
// - Network : pas de connexion, timeout, corps illisible
// - Http    : réponse non-2xx
// - Payload : JSON malformé ou champs requis manquants
// ============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Longueur max de l'extrait de corps conservé dans une erreur HTTP
const BODY_EXCERPT_LEN: usize = 200;

/// Erreur d'un appel au backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pas de connexion, timeout, ou lecture du corps interrompue
    #[error("backend injoignable : {0}")]
    Network(#[from] reqwest::Error),

    /// Le backend a répondu avec un statut non-2xx
    #[error("le backend a retourné HTTP {status} : {body}")]
    Http { status: StatusCode, body: String },

    /// Réponse illisible ou incomplète
    #[error("réponse invalide du backend : {0}")]
    Payload(String),
}

impl ApiError {
    /// Construit une erreur HTTP en tronquant le corps de la réponse
    pub fn http(status: StatusCode, body: &str) -> Self {
        let body: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        ApiError::Http { status, body }
    }

    /// Vrai pour une erreur de transport (backend down, timeout)
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Payload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_truncates_body() {
        let body = "x".repeat(1000);
        match ApiError::http(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::Http { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.len(), BODY_EXCERPT_LEN);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_error_is_payload() {
        let err: ApiError = serde_json::from_str::<Vec<f64>>("{").unwrap_err().into();
        assert!(matches!(err, ApiError::Payload(_)));
        assert!(!err.is_network());
    }
}
