// ============================================================================
// Candlestick Chart - Rendu texte ligne par ligne
// ============================================================================
// Dessine un Plot (chart.rs) avec des caractères Unicode : chandeliers pour
// l'historique, points colorés pour les prévisions à droite de la dernière
// chandelle
//
// ALGORITHME :
// - Rendu vertical : ligne par ligne de haut en bas
// - Une colonne ("slot") par chandelle puis par pas de prévision
// - Chandelle : logique des 3 zones (mèche sup, corps, mèche inf) avec
//   seuils 0.25 / 0.75 pour la précision sub-caractère
// - Prévision : un marqueur ● par modèle sur la ligne de sa valeur
//
// CARACTÈRES UNICODE :
// ┃ Corps plein          │ Mèche pleine
// ╻ Demi-corps (bas)     ╹ Demi-corps (haut)
// ╽ Transition top       ╿ Transition bottom
// ╷ Demi-mèche sup       ╵ Demi-mèche inf
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::price_bar::price_range;
use crate::models::{ForecastModel, Horizon, PriceBar};
use crate::ui::chart::{describe, ChartOutput, Plot};

// ============================================================================
// Constantes
// ============================================================================

const UNICODE_VOID: char = ' ';
const UNICODE_BODY: char = '┃';
const UNICODE_HALF_BODY_BOTTOM: char = '╻';
const UNICODE_HALF_BODY_TOP: char = '╹';
const UNICODE_WICK: char = '│';
const UNICODE_TOP: char = '╽';
const UNICODE_BOTTOM: char = '╿';
const UNICODE_UPPER_WICK: char = '╷';
const UNICODE_LOWER_WICK: char = '╵';
const FORECAST_MARKER: char = '●';

const BULLISH_COLOR: Color = Color::Rgb(52, 208, 88);
const BEARISH_COLOR: Color = Color::Rgb(234, 74, 90);

/// Largeur de l'axe Y : "{:>9.0} │ "
const Y_AXIS_WIDTH: u16 = 12;

/// Lignes hors zone de tracé : 2 bordures + ticks + labels + légende
const CHROME_HEIGHT: u16 = 5;

/// Format des labels de l'axe X (données journalières)
const X_LABEL_FORMAT: &str = "%d/%m";

/// En dessous, on affiche un message au lieu du graphique
const MIN_TERMINAL_WIDTH: u16 = 40;

/// Couleur de la ligne de prévision d'un modèle
pub fn model_color(model: ForecastModel) -> Color {
    match model {
        ForecastModel::MovingAverage => Color::Rgb(255, 193, 7),
        ForecastModel::Arima => Color::Rgb(0, 188, 212),
        ForecastModel::Gru => Color::Rgb(171, 71, 188),
        ForecastModel::Ensemble => Color::White,
    }
}

// ============================================================================
// Structure principale
// ============================================================================

/// Une colonne du graphique
#[derive(Debug, Clone, Copy)]
enum Slot<'a> {
    Candle(&'a PriceBar),
    /// index = position dans les séries de prévision
    Forecast { index: usize, timestamp: DateTime<Utc> },
}

impl Slot<'_> {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Slot::Candle(bar) => bar.timestamp,
            Slot::Forecast { timestamp, .. } => *timestamp,
        }
    }
}

/// Renderer de chandeliers japonais en mode texte
pub struct CandlestickRenderer<'a> {
    plot: &'a Plot,
    slots: Vec<Slot<'a>>,
    min_price: f64,
    max_price: f64,
    height: u16,
    width: u16,
}

impl<'a> CandlestickRenderer<'a> {
    /// Crée un renderer pour la zone donnée (bordures comprises)
    pub fn new(plot: &'a Plot, area: Rect) -> Self {
        let width = area.width.saturating_sub(Y_AXIS_WIDTH + 2);
        let (min_price, max_price) = Self::compute_price_bounds(plot);

        Self {
            plot,
            slots: Self::visible_slots(plot, width as usize),
            min_price,
            max_price,
            height: area.height.saturating_sub(CHROME_HEIGHT),
            width,
        }
    }

    /// Chandelles puis pas de prévision ; les plus anciennes chandelles
    /// disparaissent quand tout ne tient pas à l'écran
    fn visible_slots(plot: &'a Plot, max_visible: usize) -> Vec<Slot<'a>> {
        let mut slots: Vec<Slot<'a>> = plot.candles().iter().map(Slot::Candle).collect();

        // Tous les overlays retenus partagent les mêmes timestamps
        if let Some((_, points)) = plot.overlays().next() {
            slots.extend(
                points
                    .iter()
                    .enumerate()
                    .map(|(index, (timestamp, _))| Slot::Forecast {
                        index,
                        timestamp: *timestamp,
                    }),
            );
        }

        let excess = slots.len().saturating_sub(max_visible);
        slots.drain(..excess);
        slots
    }

    /// Bornes de prix sur les chandelles et les prévisions, marge de 2%
    fn compute_price_bounds(plot: &Plot) -> (f64, f64) {
        let (min_price, max_price) = plot
            .overlays()
            .flat_map(|(_, points)| points.iter().map(|(_, value)| *value))
            .filter(|p| p.is_finite())
            .fold(
                price_range(plot.candles()).unwrap_or((f64::INFINITY, f64::NEG_INFINITY)),
                |(min, max), p| (min.min(p), max.max(p)),
            );

        if min_price > max_price {
            return (0.0, 1.0);
        }

        let margin = (max_price - min_price) * 0.02;
        ((min_price - margin).max(0.0), max_price + margin)
    }

    fn price_to_height(&self, price: f64) -> f64 {
        if self.max_price == self.min_price {
            return self.height as f64 / 2.0;
        }

        (price - self.min_price) / (self.max_price - self.min_price) * self.height as f64
    }

    fn candle_color(candle: &PriceBar) -> Color {
        if candle.is_bullish() {
            BULLISH_COLOR
        } else {
            BEARISH_COLOR
        }
    }

    /// Caractère d'une chandelle à la ligne `y`
    fn render_candle(&self, candle: &PriceBar, y: u16) -> char {
        let row = y as f64;

        let high_y = self.price_to_height(candle.high);
        let low_y = self.price_to_height(candle.low);
        let top_y = self.price_to_height(candle.open.max(candle.close));
        let bottom_y = self.price_to_height(candle.open.min(candle.close));

        // Mèche supérieure
        if high_y.ceil() >= row && row >= top_y.floor() {
            return if top_y - row > 0.75 {
                UNICODE_BODY
            } else if top_y - row > 0.25 {
                if high_y - row > 0.75 {
                    UNICODE_TOP
                } else {
                    UNICODE_HALF_BODY_BOTTOM
                }
            } else if high_y - row > 0.75 {
                UNICODE_WICK
            } else if high_y - row > 0.25 {
                UNICODE_UPPER_WICK
            } else {
                UNICODE_VOID
            };
        }

        // Corps
        if top_y.floor() >= row && row >= bottom_y.ceil() {
            return UNICODE_BODY;
        }

        // Mèche inférieure
        if bottom_y.ceil() >= row && row >= low_y.floor() {
            return if bottom_y - row < 0.25 {
                UNICODE_BODY
            } else if bottom_y - row < 0.75 {
                if low_y - row < 0.25 {
                    UNICODE_BOTTOM
                } else {
                    UNICODE_HALF_BODY_TOP
                }
            } else if low_y - row < 0.25 {
                UNICODE_WICK
            } else if low_y - row < 0.75 {
                UNICODE_LOWER_WICK
            } else {
                UNICODE_VOID
            };
        }

        UNICODE_VOID
    }

    /// Marqueur de prévision à la ligne `y` (premier modèle qui tombe dessus)
    fn render_forecast(&self, index: usize, y: u16) -> Option<(char, Color)> {
        self.plot.overlays().find_map(|(model, points)| {
            let (_, value) = points.get(index)?;
            let row = self.price_to_height(*value).round().clamp(1.0, self.height as f64) as u16;
            (row == y).then_some((FORECAST_MARKER, model_color(model)))
        })
    }

    fn render_y_axis(&self, y: u16) -> String {
        if y % 4 == 0 {
            let price = self.min_price + (y as f64 * (self.max_price - self.min_price) / self.height as f64);
            format!("{:>9.0} │ ", price)
        } else {
            format!("{:>9} │ ", "")
        }
    }

    /// Espaces entre deux colonnes pour occuper toute la largeur
    fn gap(&self) -> usize {
        if self.slots.len() > 1 {
            (self.width as f64 / self.slots.len() as f64 - 1.0).round().max(0.0) as usize
        } else {
            0
        }
    }

    /// Génère toutes les lignes du graphique (tracé + axe X)
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        if self.slots.is_empty() || self.height == 0 {
            return Vec::new();
        }

        let gap = self.gap();
        let mut lines = Vec::with_capacity(self.height as usize + 2);

        for y in (1..=self.height).rev() {
            let mut spans = vec![Span::styled(self.render_y_axis(y), Style::default().fg(Color::Gray))];

            for (i, slot) in self.slots.iter().enumerate() {
                let (ch, color) = match slot {
                    Slot::Candle(bar) => (self.render_candle(bar, y), Self::candle_color(bar)),
                    Slot::Forecast { index, .. } => self
                        .render_forecast(*index, y)
                        .unwrap_or((UNICODE_VOID, Color::Reset)),
                };
                spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));

                if i + 1 < self.slots.len() && gap > 0 {
                    spans.push(Span::raw(" ".repeat(gap)));
                }
            }

            lines.push(Line::from(spans));
        }

        lines.extend(self.render_x_axis(gap));
        lines
    }

    /// Ticks et labels de date ; un label n'est posé que s'il ne chevauche
    /// pas le précédent
    fn render_x_axis(&self, gap: usize) -> Vec<Line<'static>> {
        let stride = gap + 1;
        let axis_width = self.slots.len() * stride + X_LABEL_FORMAT.len() + 1;
        let mut ticks = vec![' '; axis_width];
        let mut labels = vec![' '; axis_width];
        let mut next_free = 0;

        for (i, slot) in self.slots.iter().enumerate() {
            let column = i * stride;
            if column < next_free {
                continue;
            }

            let label = slot.timestamp().format(X_LABEL_FORMAT).to_string();
            ticks[column] = '│';
            for (offset, ch) in label.chars().enumerate() {
                if let Some(cell) = labels.get_mut(column + offset) {
                    *cell = ch;
                }
            }
            next_free = column + label.chars().count() + 2;
        }

        let margin = " ".repeat(Y_AXIS_WIDTH as usize);
        let style = Style::default().fg(Color::Gray);
        [ticks, labels]
            .into_iter()
            .map(|row| {
                let text: String = row.into_iter().collect();
                Line::from(vec![
                    Span::raw(margin.clone()),
                    Span::styled(text.trim_end().to_string(), style),
                ])
            })
            .collect()
    }
}

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine le graphique de la session (historique + prévisions)
pub fn render_price_chart(frame: &mut Frame, app: &App, area: Rect) {
    let plot = match describe(app.bars(), app.forecast()) {
        ChartOutput::NoData => {
            render_no_data(frame, app, area);
            return;
        }
        ChartOutput::Plot(plot) => plot,
    };

    if area.width < MIN_TERMINAL_WIDTH {
        render_too_narrow(frame, area);
        return;
    }

    let renderer = CandlestickRenderer::new(&plot, area);
    let mut lines = renderer.render_lines();
    lines.push(legend_line(&plot, app.forecast_horizon()));

    let title = match app.last_updated() {
        Some(at) => format!(
            " 🕯️ BTC-USD - {} candles (updated {}) ",
            plot.candles().len(),
            at.format("%H:%M:%S")
        ),
        None => format!(" 🕯️ BTC-USD - {} candles ", plot.candles().len()),
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );

    frame.render_widget(paragraph, area);
}

/// Légende des prévisions affichées et des overlays écartés
fn legend_line(plot: &Plot, horizon: Option<Horizon>) -> Line<'static> {
    let mut spans = vec![Span::raw(" ".repeat(Y_AXIS_WIDTH as usize))];

    let mut overlays = plot.overlays().peekable();
    if overlays.peek().is_none() {
        spans.push(Span::styled(
            "[f] forecast",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        if let Some(horizon) = horizon {
            spans.push(Span::styled(
                format!("Forecast {}: ", horizon.label()),
                Style::default().fg(Color::Gray),
            ));
        }
        for (model, _) in overlays {
            spans.push(Span::styled(
                format!("{} {}  ", FORECAST_MARKER, model.label()),
                Style::default().fg(model_color(model)),
            ));
        }
    }

    for warning in &plot.warnings {
        spans.push(Span::styled(
            format!("  ⚠ {}", warning),
            Style::default().fg(Color::Yellow),
        ));
    }

    Line::from(spans)
}

// ============================================================================
// Placeholders
// ============================================================================

/// Aucune chandelle : placeholder au lieu du graphique
fn render_no_data(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" 🕯️ BTC-USD ");

    let hint = if app.status().is_connected() {
        "Press [r] to ingest and load the latest data"
    } else {
        "Waiting for the backend..."
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_too_narrow(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" ⚠ ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Terminal too narrow (min {} columns)", MIN_TERMINAL_WIDTH),
            Style::default().fg(Color::Yellow),
        )),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
