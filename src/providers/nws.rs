use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    AlertSeverity, AlertUrgency, ModelElevation, NormalizedDailyForecast, WeatherAlert,
};
use crate::error::FetchError;
use crate::geo::CompassPoint;
use crate::providers::{ForecastProvider, HourlySample, clamp_horizon, three_hour_periods};

const NWS_URL: &str = "https://api.weather.gov";
const PROVIDER: &str = "nws";
const NWS_USER_AGENT: &str = "ridgecast/0.4 github.com/ridgecast/ridgecast";

const MPH_TO_KMH: f64 = 1.609_344;

/// US National Weather Service adapter (api.weather.gov). Forecasts take
/// two round trips: a point lookup resolves the grid, then the gridded
/// hourly forecast is fetched from the URL the point lookup returned.
///
/// The only adapter with a real warning feed.
#[derive(Debug, Clone)]
pub struct Nws {
    client: Client,
    base_url: String,
}

impl Default for Nws {
    fn default() -> Self {
        Self::new()
    }
}

impl Nws {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(NWS_URL)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, NWS_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|err| FetchError::Decode {
            provider: PROVIDER,
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl ForecastProvider for Nws {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn supports_alerts(&self) -> bool {
        true
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        let point_url = format!("{}/points/{latitude:.4},{longitude:.4}", self.base_url);
        let point: PointResponse = self.get_json(&point_url).await?;

        let hourly_url = point
            .properties
            .forecast_hourly
            .ok_or_else(|| FetchError::Payload {
                provider: PROVIDER,
                message: "point lookup returned no hourly forecast url".to_string(),
            })?;
        let forecast: ForecastResponse = self.get_json(&hourly_url).await?;

        let samples: Vec<HourlySample> = forecast
            .properties
            .periods
            .iter()
            .filter_map(parse_period)
            .collect();

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
            model_elevation: forecast
                .properties
                .elevation
                .and_then(|e| e.value)
                .map_or(ModelElevation::Unresolved, ModelElevation::Known),
        })
    }

    async fn alerts(&self, latitude: f64, longitude: f64) -> Vec<WeatherAlert> {
        let url = format!(
            "{}/alerts/active?point={latitude:.4},{longitude:.4}",
            self.base_url
        );
        match self.get_json::<AlertResponse>(&url).await {
            Ok(payload) => payload
                .features
                .into_iter()
                .map(|feature| {
                    let p = feature.properties;
                    WeatherAlert {
                        event: p.event.unwrap_or_default(),
                        headline: p.headline.unwrap_or_default(),
                        severity: AlertSeverity::from_cap(p.severity.as_deref().unwrap_or("")),
                        urgency: AlertUrgency::from_cap(p.urgency.as_deref().unwrap_or("")),
                        expires: p.expires.and_then(|s| {
                            DateTime::parse_from_rfc3339(&s)
                                .ok()
                                .map(|dt| dt.with_timezone(&Utc))
                        }),
                    }
                })
                .collect(),
            Err(err) => {
                warn!(provider = PROVIDER, error = %err, "alert fetch failed, continuing without alerts");
                Vec::new()
            }
        }
    }
}

fn parse_period(period: &HourlyPeriod) -> Option<HourlySample> {
    let timestamp = DateTime::parse_from_rfc3339(&period.start_time)
        .ok()?
        .with_timezone(&Utc);

    let temperature_c = period.temperature.map(|t| {
        if period.temperature_unit.as_deref() == Some("C") {
            t
        } else {
            (t - 32.0) * 5.0 / 9.0
        }
    });

    let wind_kmh = period.wind_speed.as_deref().and_then(parse_wind_mph);

    Some(HourlySample {
        timestamp,
        temperature_c,
        rain_chance_pct: period
            .probability_of_precipitation
            .as_ref()
            .and_then(|v| v.value),
        rain_mm: None,
        snow_cm: None,
        wind_kmh,
        wind_gust_kmh: None,
        wind_direction_deg: period
            .wind_direction
            .as_deref()
            .and_then(CompassPoint::from_abbreviation)
            .map(CompassPoint::degrees),
        cloud_cover_pct: None,
        freezing_level_m: None,
        description: period.short_forecast.clone(),
    })
}

/// NWS reports wind as prose, "10 mph" or "5 to 10 mph". Take the upper
/// figure and convert.
fn parse_wind_mph(value: &str) -> Option<f64> {
    value
        .split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .next_back()
        .map(|mph| mph * MPH_TO_KMH)
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    #[serde(rename = "forecastHourly")]
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    elevation: Option<ElevationValue>,
    #[serde(default)]
    periods: Vec<HourlyPeriod>,
}

#[derive(Debug, Deserialize)]
struct ElevationValue {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyPeriod {
    #[serde(rename = "startTime")]
    start_time: String,
    temperature: Option<f64>,
    #[serde(rename = "temperatureUnit")]
    temperature_unit: Option<String>,
    #[serde(rename = "probabilityOfPrecipitation")]
    probability_of_precipitation: Option<UnitValue>,
    #[serde(rename = "windSpeed")]
    wind_speed: Option<String>,
    #[serde(rename = "windDirection")]
    wind_direction: Option<String>,
    #[serde(rename = "shortForecast")]
    short_forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnitValue {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AlertResponse {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AlertProperties {
    event: Option<String>,
    headline: Option<String>,
    severity: Option<String>,
    urgency: Option<String>,
    expires: Option<String>,
}
