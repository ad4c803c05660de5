use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::{ModelElevation, NormalizedDailyForecast};
use crate::error::FetchError;
use crate::providers::{ForecastProvider, HourlySample, clamp_horizon, three_hour_periods};

const BRIGHT_SKY_URL: &str = "https://api.brightsky.dev";
const PROVIDER: &str = "bright-sky";

/// Bright Sky adapter: the JSON front for DWD open data, serving Germany
/// and its neighbours. Hourly records in DWD units (already metric).
#[derive(Debug, Clone)]
pub struct BrightSky {
    client: Client,
    base_url: String,
}

impl Default for BrightSky {
    fn default() -> Self {
        Self::new()
    }
}

impl BrightSky {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(BRIGHT_SKY_URL)
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
impl ForecastProvider for BrightSky {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        let today = Utc::now().date_naive();
        let last = today + Duration::days(i64::from(days));
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", format!("{latitude:.4}")),
                ("lon", format!("{longitude:.4}")),
                ("date", today.format("%Y-%m-%d").to_string()),
                ("last_date", last.format("%Y-%m-%d").to_string()),
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

        let payload: BrightSkyResponse =
            response.json().await.map_err(|err| FetchError::Decode {
                provider: PROVIDER,
                message: err.to_string(),
            })?;

        let samples: Vec<HourlySample> = payload.weather.iter().filter_map(parse_record).collect();

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
            // Station height of the first contributing source is the
            // elevation the record temperatures are valid for.
            model_elevation: payload
                .sources
                .iter()
                .find_map(|s| s.height)
                .map_or(ModelElevation::Unresolved, ModelElevation::Known),
        })
    }
}

fn parse_record(record: &WeatherRecord) -> Option<HourlySample> {
    let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
        .ok()?
        .with_timezone(&Utc);

    let snowing = record.condition.as_deref() == Some("snow");

    Some(HourlySample {
        timestamp,
        temperature_c: record.temperature,
        rain_chance_pct: record.precipitation_probability,
        rain_mm: if snowing { None } else { record.precipitation },
        // DWD reports liquid-equivalent precipitation; 10:1 ratio gives
        // centimetres of snow.
        snow_cm: if snowing { record.precipitation } else { None },
        wind_kmh: record.wind_speed,
        wind_gust_kmh: record.wind_gust_speed,
        wind_direction_deg: record.wind_direction,
        cloud_cover_pct: record.cloud_cover,
        freezing_level_m: None,
        description: record.condition.clone(),
    })
}

#[derive(Debug, Deserialize)]
struct BrightSkyResponse {
    #[serde(default)]
    weather: Vec<WeatherRecord>,
    #[serde(default)]
    sources: Vec<SourceRecord>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WeatherRecord {
    timestamp: String,
    temperature: Option<f64>,
    precipitation: Option<f64>,
    precipitation_probability: Option<f64>,
    wind_speed: Option<f64>,
    wind_gust_speed: Option<f64>,
    wind_direction: Option<f64>,
    cloud_cover: Option<f64>,
    condition: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceRecord {
    height: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snow_condition_routes_precipitation_to_snow() {
        let record = WeatherRecord {
            timestamp: "2026-01-10T06:00:00+00:00".to_string(),
            temperature: Some(-2.0),
            precipitation: Some(3.0),
            condition: Some("snow".to_string()),
            ..WeatherRecord::default()
        };

        let sample = parse_record(&record).unwrap();
        assert_eq!(sample.snow_cm, Some(3.0));
        assert_eq!(sample.rain_mm, None);
    }

    #[test]
    fn rain_condition_keeps_liquid_precipitation() {
        let record = WeatherRecord {
            timestamp: "2026-01-10T06:00:00+00:00".to_string(),
            temperature: Some(8.0),
            precipitation: Some(3.0),
            condition: Some("rain".to_string()),
            ..WeatherRecord::default()
        };

        let sample = parse_record(&record).unwrap();
        assert_eq!(sample.rain_mm, Some(3.0));
        assert_eq!(sample.snow_cm, None);
    }
}
