use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::{ModelElevation, NormalizedDailyForecast, NormalizedForecast};
use crate::error::FetchError;
use crate::geo::{CompassPoint, encode_geohash};
use crate::providers::{ForecastProvider, clamp_horizon};

const BOM_URL: &str = "https://api.weather.bom.gov.au";
const PROVIDER: &str = "bom";

/// Forecast locations in the BoM v1 API are addressed by 6-character
/// geohash, not by raw coordinates.
const BOM_GEOHASH_PRECISION: usize = 6;

/// Australian Bureau of Meteorology adapter. The upstream already serves
/// 3-hourly periods with native rain min/max ranges, so no bucketing is
/// needed; the payload carries no model elevation.
#[derive(Debug, Clone)]
pub struct Bom {
    client: Client,
    base_url: String,
}

impl Default for Bom {
    fn default() -> Self {
        Self::new()
    }
}

impl Bom {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(BOM_URL)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .expect("reqwest client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ForecastProvider for Bom {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        let geohash = encode_geohash(latitude, longitude, BOM_GEOHASH_PRECISION);
        let url = format!(
            "{}/v1/locations/{geohash}/forecasts/3-hourly",
            self.base_url
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let payload: BomResponse = response.json().await.map_err(|err| FetchError::Decode {
            provider: PROVIDER,
            message: err.to_string(),
        })?;

        let mut periods: Vec<NormalizedForecast> = payload
            .data
            .iter()
            .filter_map(|entry| parse_entry(entry, latitude, longitude))
            .collect();

        let mut forecast = NormalizedDailyForecast {
            provider: PROVIDER.to_string(),
            latitude,
            longitude,
            country_code: String::new(),
            periods: Vec::new(),
            alerts: Vec::new(),
            fetched_at: Utc::now(),
            is_fallback: false,
            model_elevation: ModelElevation::Unresolved,
        };
        periods.sort_by_key(|p| p.timestamp);
        clamp_horizon(&mut periods, days);
        forecast.periods = periods;
        forecast.normalize_order();

        Ok(forecast)
    }
}

fn parse_entry(entry: &BomPeriod, latitude: f64, longitude: f64) -> Option<NormalizedForecast> {
    let timestamp = DateTime::parse_from_rfc3339(&entry.time)
        .ok()?
        .with_timezone(&Utc);

    let temp = entry.temp.unwrap_or(0.0);
    let rain = entry.rain.as_ref();
    let wind = entry.wind.as_ref();

    Some(NormalizedForecast {
        provider: PROVIDER.to_string(),
        latitude,
        longitude,
        timestamp,
        temp_min_c: temp,
        temp_max_c: temp,
        rain_chance_pct: rain.and_then(|r| r.chance).unwrap_or(0.0),
        // The upstream range's upper bound is the conservative figure the
        // text tables print.
        rain_amount_mm: rain
            .and_then(|r| r.amount.as_ref())
            .and_then(|a| a.max)
            .unwrap_or(0.0),
        wind_avg_kmh: wind.and_then(|w| w.speed_kilometre).unwrap_or(0.0),
        wind_max_kmh: wind
            .and_then(|w| w.gust_speed_kilometre)
            .or(wind.and_then(|w| w.speed_kilometre))
            .unwrap_or(0.0),
        wind_direction: wind
            .and_then(|w| w.direction.as_deref())
            .and_then(CompassPoint::from_abbreviation)
            .unwrap_or(CompassPoint::N),
        cloud_cover_pct: cloud_cover_from_descriptor(entry.icon_descriptor.as_deref()),
        freezing_level_m: None,
        snow_amount_cm: 0.0,
        description: entry
            .icon_descriptor
            .as_deref()
            .unwrap_or_default()
            .replace('_', " "),
        alerts: Vec::new(),
    })
}

/// BoM publishes no numeric cloud cover in the 3-hourly feed; approximate
/// from the icon descriptor.
fn cloud_cover_from_descriptor(descriptor: Option<&str>) -> f64 {
    match descriptor.unwrap_or("") {
        "sunny" | "clear" => 5.0,
        "mostly_sunny" => 25.0,
        "partly_cloudy" => 50.0,
        "mostly_cloudy" => 75.0,
        "cloudy" | "fog" => 95.0,
        d if d.contains("rain") || d.contains("shower") || d.contains("storm") => 90.0,
        _ => 50.0,
    }
}

#[derive(Debug, Deserialize)]
struct BomResponse {
    #[serde(default)]
    data: Vec<BomPeriod>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BomPeriod {
    time: String,
    temp: Option<f64>,
    rain: Option<BomRain>,
    wind: Option<BomWind>,
    icon_descriptor: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BomRain {
    chance: Option<f64>,
    amount: Option<BomRainAmount>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BomRainAmount {
    max: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BomWind {
    speed_kilometre: Option<f64>,
    gust_speed_kilometre: Option<f64>,
    direction: Option<String>,
}
