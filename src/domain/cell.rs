use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::CompassPoint;

/// Coarse day segment used by the fixed-width SMS tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodLabel {
    Night,
    Morning,
    Afternoon,
}

impl PeriodLabel {
    /// Label for an hour of day: 0-6 and 18-24 are night, 6-12 morning,
    /// 12-18 afternoon.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..12 => PeriodLabel::Morning,
            12..18 => PeriodLabel::Afternoon,
            _ => PeriodLabel::Night,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodLabel::Night => "N",
            PeriodLabel::Morning => "AM",
            PeriodLabel::Afternoon => "PM",
        }
    }
}

impl std::fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One period in the legacy per-cell format. Precipitation is carried as a
/// min/max range because the original text tables printed ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub timestamp: DateTime<Utc>,
    pub label: PeriodLabel,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub rain_min_mm: f64,
    pub rain_max_mm: f64,
    pub snow_min_cm: f64,
    pub snow_max_cm: f64,
    pub rain_chance_pct: f64,
    pub wind_avg_kmh: f64,
    pub wind_max_kmh: f64,
    pub wind_direction: CompassPoint,
    pub cloud_cover_pct: f64,
    /// Estimated cloud base, metres ASL.
    pub cloud_base_m: f64,
    pub freezing_level_m: f64,
    /// Convective available potential energy. Unavailable from most
    /// providers, so conversions always emit 0.
    pub cape: f64,
}

/// The legacy per-cell forecast format consumed by the downstream text
/// formatting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellForecast {
    pub cell_id: String,
    pub geohash: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation the temperatures are valid for, metres ASL.
    pub base_elevation_m: f64,
    pub periods: Vec<ForecastPeriod>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub cache_age_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_the_day() {
        assert_eq!(PeriodLabel::from_hour(0), PeriodLabel::Night);
        assert_eq!(PeriodLabel::from_hour(5), PeriodLabel::Night);
        assert_eq!(PeriodLabel::from_hour(6), PeriodLabel::Morning);
        assert_eq!(PeriodLabel::from_hour(11), PeriodLabel::Morning);
        assert_eq!(PeriodLabel::from_hour(12), PeriodLabel::Afternoon);
        assert_eq!(PeriodLabel::from_hour(17), PeriodLabel::Afternoon);
        assert_eq!(PeriodLabel::from_hour(18), PeriodLabel::Night);
        assert_eq!(PeriodLabel::from_hour(23), PeriodLabel::Night);
    }

    #[test]
    fn labels_render_sms_codes() {
        assert_eq!(PeriodLabel::Night.to_string(), "N");
        assert_eq!(PeriodLabel::Morning.to_string(), "AM");
        assert_eq!(PeriodLabel::Afternoon.to_string(), "PM");
    }
}
