use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::{ModelElevation, NormalizedDailyForecast, WeatherAlert};
use crate::error::FetchError;
use crate::providers::{ForecastProvider, HourlySample, clamp_horizon, three_hour_periods};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const PROVIDER: &str = "open-meteo";

/// Open-Meteo adapter. Worldwide coverage with no API key, which is why it
/// serves as the universal fallback behind every national provider.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    client: Client,
    base_url: String,
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteo {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(OPEN_METEO_URL)
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
impl ForecastProvider for OpenMeteo {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "hourly",
                    "temperature_2m,precipitation_probability,precipitation,snowfall,cloud_cover,wind_speed_10m,wind_gusts_10m,wind_direction_10m,freezing_level_height,weather_code"
                        .to_string(),
                ),
                ("timezone", "UTC".to_string()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let payload: OpenMeteoResponse =
            response.json().await.map_err(|err| FetchError::Decode {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        let samples = parse_hourly(&payload.hourly);
        let mut periods = three_hour_periods(PROVIDER, latitude, longitude, samples);
        clamp_horizon(&mut periods, days);

        Ok(NormalizedDailyForecast {
            provider: PROVIDER.to_string(),
            latitude,
            longitude,
            country_code: String::new(),
            periods,
            alerts: Vec::new(),
            fetched_at: Utc::now(),
            is_fallback: false,
            model_elevation: payload
                .elevation
                .map_or(ModelElevation::Unresolved, ModelElevation::Known),
        })
    }

    async fn alerts(&self, _latitude: f64, _longitude: f64) -> Vec<WeatherAlert> {
        // Open-Meteo publishes no warning feed.
        Vec::new()
    }
}

fn parse_hourly(hourly: &HourlyBlock) -> Vec<HourlySample> {
    let mut out = Vec::new();
    for idx in 0..hourly.time.len() {
        let Some(timestamp) = parse_datetime(&hourly.time[idx]) else {
            continue;
        };

        out.push(HourlySample {
            timestamp,
            temperature_c: field(&hourly.temperature_2m, idx),
            rain_chance_pct: field(&hourly.precipitation_probability, idx),
            rain_mm: field(&hourly.precipitation, idx),
            // Open-Meteo reports snowfall in centimetres already.
            snow_cm: field(&hourly.snowfall, idx),
            wind_kmh: field(&hourly.wind_speed_10m, idx),
            wind_gust_kmh: field(&hourly.wind_gusts_10m, idx),
            wind_direction_deg: field(&hourly.wind_direction_10m, idx),
            cloud_cover_pct: field(&hourly.cloud_cover, idx),
            freezing_level_m: field(&hourly.freezing_level_height, idx),
            description: field(&hourly.weather_code, idx).map(|c| wmo_label(c).to_string()),
        });
    }
    out
}

fn field<T: Copy>(values: &[Option<T>], idx: usize) -> Option<T> {
    values.get(idx).copied().flatten()
}

fn parse_datetime(value: &str) -> Option<chrono::DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Human label for a WMO weather interpretation code.
fn wmo_label(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 | 81 | 82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    elevation: Option<f64>,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    snowfall: Vec<Option<f64>>,
    cloud_cover: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_gusts_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    freezing_level_height: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hourly_skips_bad_timestamps() {
        let block = HourlyBlock {
            time: vec!["bad".to_string(), "2026-08-01T06:00".to_string()],
            temperature_2m: vec![Some(1.0), Some(2.0)],
            ..HourlyBlock::default()
        };

        let parsed = parse_hourly(&block);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].temperature_c, Some(2.0));
    }

    #[test]
    fn freezing_level_flows_through() {
        let block = HourlyBlock {
            time: vec!["2026-08-01T06:00".to_string()],
            freezing_level_height: vec![Some(2400.0)],
            weather_code: vec![Some(75)],
            ..HourlyBlock::default()
        };

        let parsed = parse_hourly(&block);
        assert_eq!(parsed[0].freezing_level_m, Some(2400.0));
        assert_eq!(parsed[0].description.as_deref(), Some("Heavy snowfall"));
    }
}
