// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Écran unique : header (statut backend), sélecteur d'horizon, graphique,
// footer (raccourcis, chargement, notifications)
//
// CONCEPTS RATATUI :
// 1. Layout : découpage vertical en zones fixes + zone élastique
// 2. Tabs : sélecteur d'horizon
// 3. Style : couleur du statut selon ConnectionStatus
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, NotificationLevel};
use crate::models::{ConnectionStatus, Horizon};
use crate::ui::candlestick_text;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_horizon_selector(frame, app, chunks[1]);
    candlestick_text::render_price_chart(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

/// Header, sélecteur, graphique, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Horizon
            Constraint::Min(0),    // Graphique
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

/// Couleur associée à un statut de connexion
fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Unknown => Color::Gray,
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Unreachable => Color::Red,
    }
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" ₿ Bitcoin Forecast Dashboard ")
        .title_alignment(Alignment::Center);

    let status = app.status();
    let mut spans = vec![
        Span::styled("● ", Style::default().fg(status_color(status))),
        Span::styled(
            status.label(),
            Style::default()
                .fg(status_color(status))
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(version) = app.backend_version().filter(|_| status.is_connected()) {
        spans.push(Span::styled(
            format!("  (v{})", version),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(last) = app.bars().last() {
        let color = if last.is_bullish() { Color::Green } else { Color::Red };
        let arrow = if last.is_bullish() { "▲" } else { "▼" };
        spans.push(Span::raw("   Close: "));
        spans.push(Span::styled(
            format!("${:.2}", last.close),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {} {:+.2}%", arrow, last.change_percent()),
            Style::default().fg(color),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Sélecteur d'horizon
// ============================================================================

fn render_horizon_selector(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Horizon::all()
        .iter()
        .enumerate()
        .map(|(i, h)| Line::from(format!("{} {}", i + 1, h.label())))
        .collect();

    let selected = Horizon::all()
        .iter()
        .position(|h| *h == app.horizon())
        .unwrap_or_default();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Forecast Horizon [h/l] "),
        )
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
        .divider("│");

    frame.render_widget(tabs, area);
}

// ============================================================================
// Footer
// ============================================================================

/// Ordre de priorité : confirmation de quit, chargement, notification, raccourcis
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else if app.is_loading() {
        let message = app.loading_message().unwrap_or("Updating...").to_string();
        Line::from(vec![
            Span::styled("⏳ ", Style::default().fg(Color::Cyan)),
            Span::styled(
                message,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(notification) = app.notification() {
        let (icon, color) = match notification.level {
            NotificationLevel::Info => ("✓ ", Color::Green),
            NotificationLevel::Error => ("✗ ", Color::Red),
        };
        Line::from(vec![
            Span::styled(icon, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(notification.message.clone(), Style::default().fg(color)),
            Span::styled("  [Esc] dismiss", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        shortcuts_line()
    };

    let paragraph = Paragraph::new(line)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn quit_confirmation_line() -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "⚠  Press ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "[q]",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::styled(
            " again to quit, any other key to cancel ⚠",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn shortcuts_line() -> Line<'static> {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled("[q]", key),
        Span::raw(" Quit  "),
        Span::styled("[r]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Update data  "),
        Span::styled("[h/l 1-4]", key),
        Span::raw(" Horizon  "),
        Span::styled("[f]", key),
        Span::raw(" Forecast  "),
        Span::styled("[x]", key),
        Span::raw(" Clear forecast"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_initial_screen() {
        let screen = draw(&App::default());
        assert!(screen.contains("Checking backend..."));
        assert!(screen.contains("No data available"));
        assert!(screen.contains("24 Hours"));
    }

    #[test]
    fn test_quit_confirmation_in_footer() {
        let mut app = App::default();
        app.request_quit();
        assert!(draw(&app).contains("again to quit"));
    }
}
