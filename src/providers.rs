use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{NormalizedDailyForecast, NormalizedForecast, WeatherAlert};
use crate::error::FetchError;
use crate::geo::CompassPoint;

pub mod bom;
pub mod bright_sky;
pub mod met_no;
pub mod nws;
pub mod open_meteo;

pub use bom::Bom;
pub use bright_sky::BrightSky;
pub use met_no::MetNo;
pub use nws::Nws;
pub use open_meteo::OpenMeteo;

/// Seconds in one normalized forecast bucket.
const BUCKET_SECS: i64 = 3 * 3600;

/// A single upstream weather source, translated to the normalized model.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports_alerts(&self) -> bool {
        false
    }

    /// Fetch and normalize a forecast. Must fail on any network, HTTP-status
    /// or decode problem — never a silent partial success. A payload with
    /// zero periods is a degraded success and is returned as-is.
    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError>;

    /// Active alerts for a point. Best-effort: every internal failure
    /// resolves to an empty list, this never fails.
    async fn alerts(&self, _latitude: f64, _longitude: f64) -> Vec<WeatherAlert> {
        Vec::new()
    }
}

/// One hour of upstream data, in metric units, before bucketing.
#[derive(Debug, Clone, Default)]
pub(crate) struct HourlySample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub rain_chance_pct: Option<f64>,
    pub rain_mm: Option<f64>,
    pub snow_cm: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub wind_gust_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
    pub freezing_level_m: Option<f64>,
    pub description: Option<String>,
}

/// Collapse hourly samples into 3-hour periods: temperature becomes a
/// min/max range, precipitation sums, chance and gusts take the bucket
/// maximum, cloud cover and freezing level average.
pub(crate) fn three_hour_periods(
    provider: &str,
    latitude: f64,
    longitude: f64,
    samples: Vec<HourlySample>,
) -> Vec<NormalizedForecast> {
    let mut buckets: BTreeMap<i64, Vec<HourlySample>> = BTreeMap::new();
    for sample in samples {
        let slot = sample.timestamp.timestamp().div_euclid(BUCKET_SECS);
        buckets.entry(slot).or_default().push(sample);
    }

    buckets
        .into_iter()
        .filter_map(|(slot, bucket)| {
            let timestamp = Utc.timestamp_opt(slot * BUCKET_SECS, 0).single()?;
            Some(collapse_bucket(
                provider, latitude, longitude, timestamp, &bucket,
            ))
        })
        .collect()
}

fn collapse_bucket(
    provider: &str,
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
    bucket: &[HourlySample],
) -> NormalizedForecast {
    let temps: Vec<f64> = bucket.iter().filter_map(|s| s.temperature_c).collect();
    let winds: Vec<f64> = bucket.iter().filter_map(|s| s.wind_kmh).collect();

    let temp_min = fold_min(&temps);
    let temp_max = fold_max(&temps);
    let wind_avg = mean(&winds);
    let wind_max = bucket
        .iter()
        .filter_map(|s| s.wind_gust_kmh)
        .fold(wind_avg, f64::max);

    NormalizedForecast {
        provider: provider.to_string(),
        latitude,
        longitude,
        timestamp,
        temp_min_c: temp_min,
        temp_max_c: temp_max,
        rain_chance_pct: bucket
            .iter()
            .filter_map(|s| s.rain_chance_pct)
            .fold(0.0, f64::max),
        rain_amount_mm: bucket.iter().filter_map(|s| s.rain_mm).sum(),
        wind_avg_kmh: wind_avg,
        wind_max_kmh: wind_max,
        wind_direction: bucket
            .iter()
            .find_map(|s| s.wind_direction_deg)
            .map_or(CompassPoint::N, CompassPoint::from_degrees),
        cloud_cover_pct: mean(
            &bucket
                .iter()
                .filter_map(|s| s.cloud_cover_pct)
                .collect::<Vec<_>>(),
        ),
        freezing_level_m: non_empty_mean(
            &bucket
                .iter()
                .filter_map(|s| s.freezing_level_m)
                .collect::<Vec<_>>(),
        ),
        snow_amount_cm: bucket.iter().filter_map(|s| s.snow_cm).sum(),
        description: bucket
            .iter()
            .find_map(|s| s.description.clone())
            .unwrap_or_default(),
        alerts: Vec::new(),
    }
}

fn fold_min(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

fn fold_max(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn non_empty_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Truncate a period list to the requested horizon: eight 3-hour periods
/// per forecast day.
pub(crate) fn clamp_horizon(periods: &mut Vec<NormalizedForecast>, days: u8) {
    periods.truncate(usize::from(days) * 8);
}
