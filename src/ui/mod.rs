// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod candlestick_text; // Rendu des chandeliers et des prévisions (Unicode text)
pub mod chart;            // Description pure du graphique
pub mod dashboard;        // Rendu de l'écran principal
pub mod events;           // Gestion des événements clavier

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{action_for, Action, Event, EventHandler, ReadErrors};
