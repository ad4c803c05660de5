use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::warn;

use crate::domain::{
    CellForecast, ForecastPeriod, ModelElevation, NormalizedDailyForecast, NormalizedForecast,
    PeriodLabel,
};
use crate::elevation::LAPSE_RATE_C_PER_M;

/// Bridge a normalized forecast into the legacy per-cell format consumed by
/// the downstream text formatting layer.
///
/// `target_elevation_m` is only used when the provider did not publish its
/// model elevation; that substitution changes temperature accuracy, which is
/// why it is logged rather than silent. `ttl` and `now` come from the owning
/// cache so the legacy expiry metadata agrees with its configuration.
#[must_use]
pub fn normalized_to_cell(
    normalized: &NormalizedDailyForecast,
    target_elevation_m: f64,
    cell_id: &str,
    geohash: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> CellForecast {
    let base_elevation_m = match normalized.model_elevation {
        ModelElevation::Known(m) => m,
        ModelElevation::Unresolved => {
            warn!(
                provider = normalized.provider,
                target_elevation_m,
                "model elevation unresolved, substituting target elevation as cell base"
            );
            target_elevation_m
        }
    };

    let expires_at = normalized.fetched_at + ttl;
    let cache_age_seconds = (now - normalized.fetched_at).num_seconds().max(0);

    CellForecast {
        cell_id: cell_id.to_string(),
        geohash: geohash.to_string(),
        latitude: normalized.latitude,
        longitude: normalized.longitude,
        base_elevation_m,
        periods: normalized
            .periods
            .iter()
            .map(|p| convert_period(p, base_elevation_m))
            .collect(),
        fetched_at: normalized.fetched_at,
        expires_at,
        cache_age_seconds,
    }
}

fn convert_period(period: &NormalizedForecast, base_elevation_m: f64) -> ForecastPeriod {
    ForecastPeriod {
        timestamp: period.timestamp,
        label: PeriodLabel::from_hour(period.timestamp.hour()),
        temp_min_c: period.temp_min_c,
        temp_max_c: period.temp_max_c,
        rain_min_mm: 0.0,
        rain_max_mm: round_tenth(period.rain_amount_mm),
        snow_min_cm: 0.0,
        snow_max_cm: round_tenth(period.snow_amount_cm),
        rain_chance_pct: period.rain_chance_pct,
        wind_avg_kmh: period.wind_avg_kmh,
        wind_max_kmh: period.wind_max_kmh,
        wind_direction: period.wind_direction,
        cloud_cover_pct: period.cloud_cover_pct,
        cloud_base_m: cloud_base_for_cover(period.cloud_cover_pct),
        freezing_level_m: period
            .freezing_level_m
            .unwrap_or_else(|| estimate_freezing_level(period.temp_max_c, base_elevation_m)),
        cape: 0.0,
    }
}

/// Reverse bridge for legacy-cached cells. Lossy on purpose: the range
/// collapses to its upper bound (`rain_amount := rain_max`), a conservative
/// approximation, and `cloud_base`/`cape` are dropped.
#[must_use]
pub fn cell_to_normalized(cell: &CellForecast, country_code: &str) -> NormalizedDailyForecast {
    NormalizedDailyForecast {
        provider: "cell".to_string(),
        latitude: cell.latitude,
        longitude: cell.longitude,
        country_code: country_code.to_uppercase(),
        periods: cell
            .periods
            .iter()
            .map(|p| NormalizedForecast {
                provider: "cell".to_string(),
                latitude: cell.latitude,
                longitude: cell.longitude,
                timestamp: p.timestamp,
                temp_min_c: p.temp_min_c,
                temp_max_c: p.temp_max_c,
                rain_chance_pct: p.rain_chance_pct,
                rain_amount_mm: p.rain_max_mm,
                wind_avg_kmh: p.wind_avg_kmh,
                wind_max_kmh: p.wind_max_kmh,
                wind_direction: p.wind_direction,
                cloud_cover_pct: p.cloud_cover_pct,
                freezing_level_m: Some(p.freezing_level_m),
                snow_amount_cm: p.snow_max_cm,
                description: String::new(),
                alerts: Vec::new(),
            })
            .collect(),
        alerts: Vec::new(),
        fetched_at: cell.fetched_at,
        is_fallback: false,
        model_elevation: ModelElevation::Known(cell.base_elevation_m),
    }
}

/// Discrete cloud-base estimate from total cover. The buckets mirror what
/// the original text product printed.
fn cloud_base_for_cover(cloud_cover_pct: f64) -> f64 {
    if cloud_cover_pct >= 80.0 {
        600.0
    } else if cloud_cover_pct >= 60.0 {
        900.0
    } else if cloud_cover_pct >= 40.0 {
        1200.0
    } else if cloud_cover_pct >= 20.0 {
        1500.0
    } else {
        2000.0
    }
}

/// Where the 0 C isotherm sits if the cell's max temperature holds at its
/// base elevation and cools at the standard lapse rate.
fn estimate_freezing_level(temp_max_c: f64, base_elevation_m: f64) -> f64 {
    (base_elevation_m + temp_max_c / LAPSE_RATE_C_PER_M).max(0.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
