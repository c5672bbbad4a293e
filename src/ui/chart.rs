// ============================================================================
// Chart : description du graphique
// ============================================================================
// Fonction pure : (chandelles, prévisions optionnelles) -> description du plot
//
// CONCEPTS RUST :
// 1. Enums comme résultat : NoData ou Plot, le dessin n'a pas à deviner
// 2. Iterator chaining : timestamps dérivés par scan depuis la dernière chandelle
// 3. Aucune dépendance au terminal : testable sans ratatui
//
// Le dessin lui-même est fait par candlestick_text.rs
// ============================================================================

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{forecast_step, ForecastBundle, ForecastModel, PriceBar};

/// Une série du graphique
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// Historique OHLC, axe x croissant
    Candlestick { bars: Vec<PriceBar> },

    /// Prévision d'un modèle
    Line {
        model: ForecastModel,
        points: Vec<(DateTime<Utc>, f64)>,
    },
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Candlestick { bars } => bars.len(),
            Series::Line { points, .. } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overlay écarté au lieu d'être dessiné décalé
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayWarning {
    pub model: ForecastModel,
    pub values: usize,
    pub timestamps: usize,
}

impl std::fmt::Display for OverlayWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dropped: {} values for {} timestamps",
            self.model.label(),
            self.values,
            self.timestamps
        )
    }
}

/// Graphique à dessiner
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    /// Chandelles en premier, puis une ligne par modèle retenu
    pub series: Vec<Series>,
    pub warnings: Vec<OverlayWarning>,
}

impl Plot {
    pub fn candles(&self) -> &[PriceBar] {
        self.series
            .iter()
            .find_map(|s| match s {
                Series::Candlestick { bars } => Some(bars.as_slice()),
                Series::Line { .. } => None,
            })
            .unwrap_or(&[])
    }

    pub fn overlays(&self) -> impl Iterator<Item = (ForecastModel, &[(DateTime<Utc>, f64)])> {
        self.series.iter().filter_map(|s| match s {
            Series::Line { model, points } => Some((*model, points.as_slice())),
            Series::Candlestick { .. } => None,
        })
    }
}

/// Résultat du renderer
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutput {
    /// Aucune chandelle : placeholder, aucune série
    NoData,
    Plot(Plot),
}

/// Décrit le graphique pour des chandelles et des prévisions éventuelles
///
/// - Sans chandelle : NoData
/// - Sinon : une série chandelier + une ligne par modèle bien formé
/// - Timestamps des prévisions : explicites si fournis, sinon un pas de
///   forecast_step() par index après la dernière chandelle
/// - Un overlay dont la longueur diffère du nombre de timestamps est écarté
pub fn describe(bars: &[PriceBar], forecast: Option<&ForecastBundle>) -> ChartOutput {
    let Some(last) = bars.last() else {
        return ChartOutput::NoData;
    };

    let mut series = vec![Series::Candlestick { bars: bars.to_vec() }];
    let mut warnings = Vec::new();

    if let Some(bundle) = forecast.filter(|b| !b.is_empty()) {
        let timestamps = forecast_timestamps(last.timestamp, bundle);

        for (model, values) in &bundle.series {
            if values.len() != timestamps.len() {
                let warning = OverlayWarning {
                    model: *model,
                    values: values.len(),
                    timestamps: timestamps.len(),
                };
                warn!(model = model.key(), values = warning.values, timestamps = warning.timestamps, "Dropping misaligned forecast overlay");
                warnings.push(warning);
                continue;
            }

            let points = timestamps.iter().copied().zip(values.iter().copied()).collect();
            series.push(Series::Line { model: *model, points });
        }
    }

    ChartOutput::Plot(Plot { series, warnings })
}

/// Timestamps des prévisions : explicites, ou dérivés depuis `last`
fn forecast_timestamps(last: DateTime<Utc>, bundle: &ForecastBundle) -> Vec<DateTime<Utc>> {
    if let Some(dates) = bundle.explicit_dates() {
        return dates.to_vec();
    }

    let step = forecast_step();
    (0..bundle.reference_len())
        .scan(last, |current, _| {
            *current += step;
            Some(*current)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(day: u32) -> PriceBar {
        PriceBar::new(
            Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            100.0,
            110.0,
            95.0,
            105.0,
        )
    }

    fn plot(output: ChartOutput) -> Plot {
        match output {
            ChartOutput::Plot(plot) => plot,
            ChartOutput::NoData => panic!("expected a plot"),
        }
    }

    #[test]
    fn test_single_bar_single_candlestick_series() {
        let plot = plot(describe(&[bar(1)], None));

        assert_eq!(plot.series.len(), 1);
        assert!(matches!(&plot.series[0], Series::Candlestick { .. }));
        assert_eq!(plot.series[0].len(), 1);
        assert!(!plot.series[0].is_empty());
        assert!(plot.warnings.is_empty());
    }

    #[test]
    fn test_empty_bars_is_no_data() {
        assert_eq!(describe(&[], None), ChartOutput::NoData);

        let bundle = ForecastBundle::new().with_series(ForecastModel::Ensemble, vec![1.0]);
        assert_eq!(describe(&[], Some(&bundle)), ChartOutput::NoData);
    }

    #[test]
    fn test_derived_timestamps_step_from_last_bar() {
        let bars = [bar(1), bar(2)];
        let bundle = ForecastBundle::new().with_series(ForecastModel::Ensemble, vec![1.0, 2.0, 3.0]);

        let plot = plot(describe(&bars, Some(&bundle)));
        let (model, points) = plot.overlays().next().unwrap();

        assert_eq!(model, ForecastModel::Ensemble);
        assert_eq!(points.len(), 3);
        let last = bars[1].timestamp;
        for (i, (ts, _)) in points.iter().enumerate() {
            assert_eq!(*ts, last + forecast_step() * (i as i32 + 1));
        }
        assert_eq!(forecast_step(), Duration::days(1));
    }

    #[test]
    fn test_explicit_dates_are_used() {
        let dates: Vec<_> = (10..=11)
            .map(|d| Utc.with_ymd_and_hms(2025, 1, d, 6, 0, 0).unwrap())
            .collect();
        let bundle = ForecastBundle::new()
            .with_series(ForecastModel::Arima, vec![1.0, 2.0])
            .with_dates(dates.clone());

        let plot = plot(describe(&[bar(1)], Some(&bundle)));
        let (_, points) = plot.overlays().next().unwrap();

        let ts: Vec<_> = points.iter().map(|(t, _)| *t).collect();
        assert_eq!(ts, dates);
    }

    #[test]
    fn test_misaligned_overlay_is_dropped() {
        let bars = [bar(1), bar(2)];
        let bundle = ForecastBundle::new()
            .with_series(ForecastModel::Ensemble, vec![1.0, 2.0, 3.0])
            .with_series(ForecastModel::MovingAverage, vec![1.0, 2.0]);

        let plot = plot(describe(&bars, Some(&bundle)));

        assert_eq!(plot.candles(), &bars[..]);
        let models: Vec<_> = plot.overlays().map(|(m, _)| m).collect();
        assert_eq!(models, vec![ForecastModel::Ensemble]);
        assert_eq!(
            plot.warnings,
            vec![OverlayWarning {
                model: ForecastModel::MovingAverage,
                values: 2,
                timestamps: 3,
            }]
        );
    }

    #[test]
    fn test_reference_length_without_ensemble() {
        let bundle = ForecastBundle::new().with_series(ForecastModel::Gru, vec![5.0, 6.0]);

        let plot = plot(describe(&[bar(1)], Some(&bundle)));
        let (model, points) = plot.overlays().next().unwrap();

        assert_eq!(model, ForecastModel::Gru);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_empty_bundle_adds_no_overlay() {
        let plot = plot(describe(&[bar(1)], Some(&ForecastBundle::new())));
        assert_eq!(plot.series.len(), 1);
    }
}
