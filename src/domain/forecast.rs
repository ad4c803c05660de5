use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::CompassPoint;

/// CAP-style alert severity, ordered so the worst sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    #[must_use]
    pub fn from_cap(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "minor" => AlertSeverity::Minor,
            "moderate" => AlertSeverity::Moderate,
            "severe" => AlertSeverity::Severe,
            "extreme" => AlertSeverity::Extreme,
            _ => AlertSeverity::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertUrgency {
    Unknown,
    Past,
    Future,
    Expected,
    Immediate,
}

impl AlertUrgency {
    #[must_use]
    pub fn from_cap(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "past" => AlertUrgency::Past,
            "future" => AlertUrgency::Future,
            "expected" => AlertUrgency::Expected,
            "immediate" => AlertUrgency::Immediate,
            _ => AlertUrgency::Unknown,
        }
    }
}

/// Active weather warning attached to a forecast. Best-effort data: alert
/// retrieval never blocks forecast delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub event: String,
    pub headline: String,
    pub severity: AlertSeverity,
    pub urgency: AlertUrgency,
    pub expires: Option<DateTime<Utc>>,
}

/// The elevation a model's temperature output is physically valid for.
///
/// Kept explicit rather than defaulting silently: when a provider does not
/// publish its model elevation, the legacy converter has to substitute the
/// target elevation, and that substitution changes downstream temperature
/// accuracy. Callers see the decision instead of a buried default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelElevation {
    Known(f64),
    Unresolved,
}

impl ModelElevation {
    #[must_use]
    pub fn meters(self) -> Option<f64> {
        match self {
            ModelElevation::Known(m) => Some(m),
            ModelElevation::Unresolved => None,
        }
    }
}

/// One normalized forecast period, roughly a 3-hour bucket. All values are
/// metric regardless of what the upstream provider reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    /// Probability of precipitation, 0-100.
    pub rain_chance_pct: f64,
    pub rain_amount_mm: f64,
    pub wind_avg_kmh: f64,
    pub wind_max_kmh: f64,
    pub wind_direction: CompassPoint,
    /// Total cloud cover, 0-100.
    pub cloud_cover_pct: f64,
    /// Altitude of the 0 C isotherm, metres ASL, when the provider reports it.
    pub freezing_level_m: Option<f64>,
    pub snow_amount_cm: f64,
    pub description: String,
    pub alerts: Vec<WeatherAlert>,
}

/// A full multi-day forecast for one point, as returned by the router.
///
/// Immutable once stored in the cache: cached copies are replaced wholesale
/// at TTL expiry, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDailyForecast {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    /// ISO-3166-1 alpha-2, uppercase. Set by the router before the forecast
    /// leaves the core.
    pub country_code: String,
    /// Strictly chronologically ordered periods. May be empty: a provider
    /// returning zero periods is a degraded success, not an error.
    pub periods: Vec<NormalizedForecast>,
    pub alerts: Vec<WeatherAlert>,
    pub fetched_at: DateTime<Utc>,
    /// True when the universal fallback provider supplied the data because
    /// the country's primary provider failed.
    pub is_fallback: bool,
    pub model_elevation: ModelElevation,
}

impl NormalizedDailyForecast {
    /// Whether periods are strictly ascending by timestamp.
    #[must_use]
    pub fn is_chronological(&self) -> bool {
        self.periods
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }

    /// Sort periods ascending and drop duplicate timestamps. Adapters call
    /// this before handing a forecast to the router.
    pub fn normalize_order(&mut self) {
        self.periods.sort_by_key(|p| p.timestamp);
        self.periods.dedup_by_key(|p| p.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period(ts: DateTime<Utc>) -> NormalizedForecast {
        NormalizedForecast {
            provider: "test".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timestamp: ts,
            temp_min_c: 1.0,
            temp_max_c: 2.0,
            rain_chance_pct: 0.0,
            rain_amount_mm: 0.0,
            wind_avg_kmh: 0.0,
            wind_max_kmh: 0.0,
            wind_direction: CompassPoint::N,
            cloud_cover_pct: 0.0,
            freezing_level_m: None,
            snow_amount_cm: 0.0,
            description: String::new(),
            alerts: Vec::new(),
        }
    }

    #[test]
    fn normalize_order_sorts_and_dedupes() {
        let t0 = Utc.with_ymd_and_hms(2026, 8, 1, 6, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();

        let mut forecast = NormalizedDailyForecast {
            provider: "test".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            country_code: String::new(),
            periods: vec![period(t1), period(t0), period(t1)],
            alerts: Vec::new(),
            fetched_at: Utc::now(),
            is_fallback: false,
            model_elevation: ModelElevation::Unresolved,
        };

        assert!(!forecast.is_chronological());
        forecast.normalize_order();
        assert!(forecast.is_chronological());
        assert_eq!(forecast.periods.len(), 2);
    }

    #[test]
    fn severity_orders_worst_last() {
        assert!(AlertSeverity::Extreme > AlertSeverity::Severe);
        assert!(AlertSeverity::Minor > AlertSeverity::Unknown);
        assert_eq!(AlertSeverity::from_cap("Severe"), AlertSeverity::Severe);
        assert_eq!(AlertSeverity::from_cap("bogus"), AlertSeverity::Unknown);
    }
}
