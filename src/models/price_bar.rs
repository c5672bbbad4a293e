// ============================================================================
// Structure : PriceBar (Open, High, Low, Close)
// ============================================================================
// Représente une observation historique du prix du Bitcoin (une chandelle)
//
// CONCEPTS RUST :
// 1. DateTime<Utc> : type de chrono pour dates avec timezone UTC
// 2. f64 : floating point 64 bits pour les prix (précision suffisante)
// 3. Parsing tolérant : le backend renvoie "2025-09-01" ou "2025-09-01T00:00:00"
// ============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Une chandelle japonaise (candlestick) reçue du backend
///
/// Immuable une fois reçue : seul le client API en produit.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    /// Timestamp de la chandelle
    pub timestamp: DateTime<Utc>,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,
}

impl PriceBar {
    /// Constructeur : crée une nouvelle chandelle
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Vérifie si la chandelle est haussière (close >= open)
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Variation en pourcentage depuis l'ouverture
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            ((self.close - self.open) / self.open) * 100.0
        }
    }
}

/// Parse un timestamp tel que renvoyé par le backend
///
/// CONCEPT RUST : Chaîne de fallbacks avec or_else
/// - RFC 3339 complet : "2025-09-01T00:00:00Z", "2025-09-01T00:00:00+00:00"
/// - ISO sans timezone (Python isoformat) : "2025-09-01T00:00:00", avec ou sans fraction
/// - Date seule : "2025-09-01" (minuit UTC)
///
/// Retourne None si aucun format ne correspond.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

/// Prix min (low) et max (high) sur une série de chandelles
///
/// Retourne None pour une série vide.
pub fn price_range(bars: &[PriceBar]) -> Option<(f64, f64)> {
    if bars.is_empty() {
        return None;
    }

    let low = bars.iter().fold(f64::INFINITY, |min, b| min.min(b.low));
    let high = bars.iter().fold(f64::NEG_INFINITY, |max, b| max.max(b.high));
    Some((low, high))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_bar_bullish() {
        let bar = PriceBar::new(Utc::now(), 100.0, 110.0, 95.0, 105.0);
        assert!(bar.is_bullish());

        let bar = PriceBar::new(Utc::now(), 100.0, 105.0, 90.0, 95.0);
        assert!(!bar.is_bullish());
    }

    #[test]
    fn test_change_percent() {
        let bar = PriceBar::new(Utc::now(), 100.0, 110.0, 95.0, 105.0);
        assert_eq!(bar.change_percent(), 5.0);

        let flat = PriceBar::new(Utc::now(), 0.0, 0.0, 0.0, 0.0);
        assert_eq!(flat.change_percent(), 0.0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let date_only = parse_timestamp("2025-01-01").unwrap();
        assert_eq!(date_only.year(), 2025);
        assert_eq!(date_only.hour(), 0);

        let python_iso = parse_timestamp("2025-09-01T06:30:00").unwrap();
        assert_eq!(python_iso.hour(), 6);
        assert_eq!(python_iso.minute(), 30);

        let rfc3339 = parse_timestamp("2025-09-01T06:30:00+02:00").unwrap();
        assert_eq!(rfc3339.hour(), 4);

        let with_fraction = parse_timestamp("2025-09-01T00:00:00.250").unwrap();
        assert_eq!(with_fraction.day(), 1);

        assert!(parse_timestamp("hier").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_price_range() {
        assert!(price_range(&[]).is_none());

        let bars = vec![
            PriceBar::new(Utc::now(), 100.0, 110.0, 95.0, 105.0),
            PriceBar::new(Utc::now(), 105.0, 120.0, 101.0, 118.0),
        ];
        assert_eq!(price_range(&bars), Some((95.0, 120.0)));
    }
}
