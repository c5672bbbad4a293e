// ============================================================================
// btc-dashboard : point d'entrée
// ============================================================================
// Dashboard terminal : historique Bitcoin en chandeliers, prévisions des
// modèles du backend, statut de connexion rafraîchi en continu
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop synchrone : render → input → résultats → tick
// 3. Runtime tokio possédé par main : les appels HTTP tournent en tâches
// 4. Channel mpsc : les résultats reviennent à l'event loop, seul
//    propriétaire de App (aucun Mutex)
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tracing::{debug, error, info};

use btc_dashboard::api::{ApiClient, Backend};
use btc_dashboard::app::App;
use btc_dashboard::config::Config;
use btc_dashboard::ui::{action_for, events::is_quit_event, render, Action, Event, EventHandler, ReadErrors};
use btc_dashboard::worker::{AppCommand, AppResult, Poller, Worker};

// ============================================================================
// Initialisation du logging
// ============================================================================
// Le TUI possède stdout : les logs vont dans un fichier à rotation quotidienne
//
//   tail -f ~/.local/share/btc-dashboard/logs/btc-dashboard.log.*
//   RUST_LOG=btc_dashboard=trace btc-dashboard
// ============================================================================

fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Échec de la création du répertoire de logs {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "btc-dashboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btc_dashboard=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::parse();

    // Le dashboard reste utilisable sans logs
    init_logging(&config.log_dir()).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(base_url = %config.base_url, "btc-dashboard starting up");

    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let client = ApiClient::new(&config.base_url, config.request_timeout())
        .context("Échec de la création du client HTTP")?;
    let backend: Arc<dyn Backend> = Arc::new(client);

    let (result_tx, result_rx) = mpsc::unbounded_channel::<AppResult>();
    let worker = Worker::new(runtime.handle().clone(), Arc::clone(&backend), result_tx.clone());

    let mut app = App::from_config(&config);

    // Mount : health check + historique, puis polling périodique
    worker.dispatch(app.mount());
    let poller = Poller::start(runtime.handle(), backend, config.poll_interval(), result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &worker, result_rx);

    // Teardown : le polling s'arrête avant la restauration du terminal
    poller.stop();

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(()) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    // Les tâches encore en vol (refresh, forecast) sont abandonnées
    runtime.shutdown_background();

    result
}

// ============================================================================
// Event Loop
// ============================================================================
// 1. RENDER   : dessine l'état courant
// 2. INPUT    : attend une touche au plus 250ms
// 3. RÉSULTATS: applique tous les résultats arrivés, dans l'ordre
// 4. TICK     : expiration des notifications
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    worker: &Worker,
    mut results: UnboundedReceiver<AppResult>,
) -> Result<()> {
    let mut read_errors = ReadErrors::new();

    while app.is_running() {
        terminal.draw(|frame| render(frame, app))?;

        // Des erreurs de lecture répétées arrêtent la boucle
        if let Some(event) = read_errors.check(events.next())? {
            if let Some(command) = handle_event(app, &event) {
                worker.dispatch(command);
            }
        }

        loop {
            match results.try_recv() {
                Ok(result) => app.apply(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("Result channel disconnected");
                    break;
                }
            }
        }

        app.tick(Instant::now());
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Met à jour App selon la touche pressée ; retourne la commande à lancer
///
/// CONCEPT : Two-step quit
/// - Première pression de 'q' : confirmation demandée
/// - Deuxième pression : sortie
/// - Toute autre touche annule la confirmation (et n'a pas d'autre effet)
fn handle_event(app: &mut App, event: &Event) -> Option<AppCommand> {
    if !matches!(event, Event::Key(_)) {
        return None;
    }

    if app.is_awaiting_quit_confirmation() {
        if is_quit_event(event) {
            info!("User confirmed quit");
            app.quit();
        } else {
            debug!("Quit cancelled");
            app.cancel_quit();
        }
        return None;
    }

    match action_for(event)? {
        Action::Quit => {
            app.request_quit();
            None
        }
        Action::Dismiss => {
            app.dismiss_notification();
            None
        }
        Action::Refresh => app.request_refresh(Local::now().date_naive()),
        Action::Forecast => app.request_forecast(),
        Action::ClearForecast => {
            app.clear_forecast();
            None
        }
        Action::NextHorizon => {
            app.next_horizon();
            None
        }
        Action::PreviousHorizon => {
            app.previous_horizon();
            None
        }
        Action::SelectHorizon(horizon) => {
            app.select_horizon(horizon);
            None
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    Terminal::new(CrosstermBackend::new(stdout)).context("Échec de la création du terminal")
}

/// Restaure le terminal, même après une erreur de la boucle
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
