// ============================================================================
// btc-dashboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;    // Client HTTP du backend de prévision
pub mod app;    // État de la session (contrôleur)
pub mod config; // Paramètres de ligne de commande
pub mod models; // Structures de données
pub mod ui;     // Interface utilisateur
pub mod worker; // Exécution des commandes + polling
