// ============================================================================
// Structure : ForecastBundle
// ============================================================================
// Prédictions renvoyées par le backend pour un horizon donné : une série
// numérique par modèle (moyenne mobile, ARIMA, GRU, ensemble) et, si le
// backend les fournit, les timestamps exacts de chaque pas de prévision.
//
// CONCEPTS RUST :
// 1. Enum + match exhaustif pour les modèles connus
// 2. Vec<(K, V)> plutôt que HashMap : l'ordre d'affichage est stable
// 3. Conversion depuis le JSON brut avec TryFrom
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::models::price_bar::parse_timestamp;

/// Pas implicite entre deux points de prévision quand le backend
/// ne fournit pas de dates explicites : un jour.
pub fn forecast_step() -> Duration {
    Duration::days(1)
}

/// Modèles de prévision connus du backend
///
/// L'ordre des variants est l'ordre d'affichage des overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForecastModel {
    /// Moyenne mobile
    MovingAverage,
    /// ARIMA(2,1,2)
    Arima,
    /// Réseau récurrent GRU (optionnel côté backend)
    Gru,
    /// Combinaison des modèles précédents
    Ensemble,
}

impl ForecastModel {
    /// Nom de la clé JSON côté backend
    pub fn key(&self) -> &'static str {
        match self {
            ForecastModel::MovingAverage => "moving_average",
            ForecastModel::Arima => "arima",
            ForecastModel::Gru => "gru",
            ForecastModel::Ensemble => "ensemble",
        }
    }

    /// Label pour la légende du graphique
    pub fn label(&self) -> &'static str {
        match self {
            ForecastModel::MovingAverage => "Moving Average",
            ForecastModel::Arima => "ARIMA",
            ForecastModel::Gru => "GRU",
            ForecastModel::Ensemble => "Ensemble",
        }
    }
}

/// Ensemble de prévisions pour un horizon
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastBundle {
    /// Timestamps explicites (None : dérivés depuis la dernière chandelle)
    pub dates: Option<Vec<DateTime<Utc>>>,

    /// Séries par modèle, triées dans l'ordre de ForecastModel
    pub series: Vec<(ForecastModel, Vec<f64>)>,
}

impl ForecastBundle {
    /// Crée un bundle sans dates explicites
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute (ou remplace) la série d'un modèle
    ///
    /// Garde `series` triée par modèle pour un rendu déterministe.
    pub fn with_series(mut self, model: ForecastModel, values: Vec<f64>) -> Self {
        self.series.retain(|(m, _)| *m != model);
        self.series.push((model, values));
        self.series.sort_by_key(|(m, _)| *m);
        self
    }

    /// Fixe les timestamps explicites
    pub fn with_dates(mut self, dates: Vec<DateTime<Utc>>) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Série d'un modèle donné
    pub fn get(&self, model: ForecastModel) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(m, _)| *m == model)
            .map(|(_, values)| values.as_slice())
    }

    /// Vrai si aucune série n'est présente
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Dates explicites utilisables (une liste vide compte comme absente)
    pub fn explicit_dates(&self) -> Option<&[DateTime<Utc>]> {
        self.dates
            .as_deref()
            .filter(|dates| !dates.is_empty())
    }

    /// Longueur de référence pour dériver les timestamps
    ///
    /// L'ensemble fait foi ; à défaut, la première série présente.
    pub fn reference_len(&self) -> usize {
        self.get(ForecastModel::Ensemble)
            .or_else(|| self.series.first().map(|(_, values)| values.as_slice()))
            .map(|values| values.len())
            .unwrap_or(0)
    }
}

// ============================================================================
// JSON brut du backend
// ============================================================================
// { "dates": [...], "moving_average": [...], "arima": [...],
//   "gru": [...] | null, "ensemble": [...] }
// ============================================================================

/// Prédictions telles que sérialisées par le backend
#[derive(Debug, Default, Deserialize)]
pub struct RawPredictions {
    #[serde(default)]
    pub dates: Option<Vec<String>>,
    #[serde(default)]
    pub moving_average: Option<Vec<f64>>,
    #[serde(default)]
    pub arima: Option<Vec<f64>>,
    #[serde(default)]
    pub gru: Option<Vec<f64>>,
    #[serde(default)]
    pub ensemble: Option<Vec<f64>>,
}

impl TryFrom<RawPredictions> for ForecastBundle {
    type Error = String;

    /// Convertit le JSON brut ; une date illisible invalide tout le bundle
    fn try_from(raw: RawPredictions) -> Result<Self, Self::Error> {
        let dates = match raw.dates {
            Some(dates) => Some(
                dates
                    .iter()
                    .map(|d| parse_timestamp(d).ok_or_else(|| format!("date de prévision invalide : {d:?}")))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        let mut bundle = ForecastBundle {
            dates,
            series: Vec::new(),
        };

        let columns = [
            (ForecastModel::MovingAverage, raw.moving_average),
            (ForecastModel::Arima, raw.arima),
            (ForecastModel::Gru, raw.gru),
            (ForecastModel::Ensemble, raw.ensemble),
        ];

        for (model, values) in columns {
            if let Some(values) = values {
                bundle = bundle.with_series(model, values);
            }
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_len_prefers_ensemble() {
        let bundle = ForecastBundle::new()
            .with_series(ForecastModel::Arima, vec![1.0, 2.0])
            .with_series(ForecastModel::Ensemble, vec![1.0, 2.0, 3.0]);
        assert_eq!(bundle.reference_len(), 3);

        let no_ensemble = ForecastBundle::new().with_series(ForecastModel::Arima, vec![1.0, 2.0]);
        assert_eq!(no_ensemble.reference_len(), 2);

        assert_eq!(ForecastBundle::new().reference_len(), 0);
    }

    #[test]
    fn test_series_kept_in_model_order() {
        let bundle = ForecastBundle::new()
            .with_series(ForecastModel::Ensemble, vec![3.0])
            .with_series(ForecastModel::MovingAverage, vec![1.0])
            .with_series(ForecastModel::Ensemble, vec![4.0]);

        let models: Vec<ForecastModel> = bundle.series.iter().map(|(m, _)| *m).collect();
        assert_eq!(models, vec![ForecastModel::MovingAverage, ForecastModel::Ensemble]);
        assert_eq!(bundle.get(ForecastModel::Ensemble), Some(&[4.0][..]));
    }

    #[test]
    fn test_from_raw_predictions_skips_null_gru() {
        let raw: RawPredictions = serde_json::from_str(
            r#"{
                "dates": ["2025-09-02T00:00:00", "2025-09-02T01:00:00"],
                "moving_average": [100.0, 101.0],
                "arima": [99.5, 100.5],
                "gru": null,
                "ensemble": [99.8, 100.8]
            }"#,
        )
        .unwrap();

        let bundle = ForecastBundle::try_from(raw).unwrap();
        assert_eq!(bundle.series.len(), 3);
        assert!(bundle.get(ForecastModel::Gru).is_none());
        assert_eq!(bundle.explicit_dates().map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_from_raw_predictions_rejects_bad_date() {
        let raw = RawPredictions {
            dates: Some(vec!["demain".to_string()]),
            ensemble: Some(vec![1.0]),
            ..Default::default()
        };
        assert!(ForecastBundle::try_from(raw).is_err());
    }

    #[test]
    fn test_empty_dates_count_as_absent() {
        let bundle = ForecastBundle::new()
            .with_dates(Vec::new())
            .with_series(ForecastModel::Ensemble, vec![1.0]);
        assert!(bundle.explicit_dates().is_none());
    }
}
