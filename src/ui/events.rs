// ============================================================================
// Gestion des événements
// ============================================================================
// Lecture du terminal (crossterm) et traduction des touches en actions
//
// CONCEPTS RUST :
// 1. Enums avec variants : un événement = une touche ou un tick
// 2. Pattern matching : une table de touches lisible en un seul match
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use crate::models::Horizon;

/// Délai maximal d'attente d'un événement : fixe la cadence de la boucle
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Erreurs de lecture consécutives tolérées avant d'arrêter la boucle
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 3;

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Pas d'événement pendant POLL_TIMEOUT (ou événement ignoré)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant au plus POLL_TIMEOUT)
    ///
    /// Resize, souris et relâchements de touche deviennent des Tick : la
    /// frame suivante redessine de toute façon l'écran entier.
    pub fn next(&self) -> Result<Event> {
        if !event::poll(POLL_TIMEOUT)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

/// Compte les erreurs de lecture du terminal
///
/// CONCEPT : Propagation bornée
/// - Une erreur isolée est journalisée, la boucle continue
/// - Au-delà de MAX_CONSECUTIVE_READ_ERRORS d'affilée, l'erreur remonte
///   avec `?` et l'event loop s'arrête au lieu de tourner à vide
#[derive(Debug, Default)]
pub struct ReadErrors {
    consecutive: u32,
}

impl ReadErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ok(None) pour une erreur tolérée
    pub fn check(&mut self, read: Result<Event>) -> Result<Option<Event>> {
        match read {
            Ok(event) => {
                self.consecutive = 0;
                Ok(Some(event))
            }
            Err(e) => {
                self.consecutive += 1;
                if self.consecutive >= MAX_CONSECUTIVE_READ_ERRORS {
                    return Err(e.context(format!(
                        "{} erreurs de lecture du terminal d'affilée",
                        self.consecutive
                    )));
                }
                warn!(error = ?e, attempt = self.consecutive, "Failed to read terminal event");
                Ok(None)
            }
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Ce que l'utilisateur demande au dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Dismiss,
    Refresh,
    Forecast,
    ClearForecast,
    NextHorizon,
    PreviousHorizon,
    SelectHorizon(Horizon),
}

/// Traduit un événement en action
///
/// CONCEPT : Table de touches
/// - q / Ctrl+C : quitter (deux pressions)
/// - Esc        : fermer la notification
/// - r          : refresh (ingestion + rechargement)
/// - f / x      : demander / retirer les prévisions
/// - h l ← →    : horizon précédent / suivant
/// - 1..4       : horizon direct
pub fn action_for(event: &Event) -> Option<Action> {
    let Event::Key(key) = event else {
        return None;
    };

    if is_quit_event(event) {
        return Some(Action::Quit);
    }

    match key.code {
        KeyCode::Esc => Some(Action::Dismiss),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Refresh),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::Forecast),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::ClearForecast),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::NextHorizon),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::PreviousHorizon),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            Horizon::from_index(index).map(Action::SelectHorizon)
        }
        _ => None,
    }
}

/// Vérifie si l'événement est 'q' ou Ctrl+C
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => true,
            KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        }
    } else {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
