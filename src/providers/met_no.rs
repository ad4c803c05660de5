use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::domain::{ModelElevation, NormalizedDailyForecast};
use crate::error::FetchError;
use crate::providers::{ForecastProvider, HourlySample, clamp_horizon, three_hour_periods};

const MET_NO_URL: &str = "https://api.met.no";
const PROVIDER: &str = "met-no";
// api.met.no rejects anonymous clients; they require an identifying agent.
const MET_NO_USER_AGENT: &str = "ridgecast/0.4 github.com/ridgecast/ridgecast";

const MS_TO_KMH: f64 = 3.6;

/// MET Norway Locationforecast 2.0 adapter, the primary source for the
/// Nordic countries.
#[derive(Debug, Clone)]
pub struct MetNo {
    client: Client,
    base_url: String,
}

impl Default for MetNo {
    fn default() -> Self {
        Self::new()
    }
}

impl MetNo {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(MET_NO_URL)
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
}

#[async_trait]
impl ForecastProvider for MetNo {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        let url = format!(
            "{}/weatherapi/locationforecast/2.0/compact",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, MET_NO_USER_AGENT)
            .query(&[
                ("lat", format!("{latitude:.4}")),
                ("lon", format!("{longitude:.4}")),
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

        let payload: MetNoResponse = response.json().await.map_err(|err| FetchError::Decode {
            provider: PROVIDER,
            message: err.to_string(),
        })?;

        let samples: Vec<HourlySample> = payload
            .properties
            .timeseries
            .iter()
            .filter_map(parse_entry)
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
            model_elevation: payload
                .geometry
                .coordinates
                .get(2)
                .copied()
                .map_or(ModelElevation::Unresolved, ModelElevation::Known),
        })
    }
}

fn parse_entry(entry: &TimeseriesEntry) -> Option<HourlySample> {
    let timestamp = entry.time.parse::<DateTime<Utc>>().ok()?;
    let instant = &entry.data.instant.details;
    // Short range carries 1-hour blocks; beyond ~60 hours only 6-hour
    // blocks remain. Use whichever is present.
    let block = entry
        .data
        .next_1_hours
        .as_ref()
        .or(entry.data.next_6_hours.as_ref());

    let temperature = instant.air_temperature;
    let precipitation = block.and_then(|b| b.details.precipitation_amount);
    // No snowfall split in the compact payload; below freezing the whole
    // amount is snow at the standard 10:1 snow-to-liquid ratio, never both.
    let snowing = matches!(temperature, Some(t) if t <= 0.5);

    Some(HourlySample {
        timestamp,
        temperature_c: temperature,
        rain_chance_pct: block.and_then(|b| b.details.probability_of_precipitation),
        rain_mm: if snowing { None } else { precipitation },
        snow_cm: if snowing { precipitation } else { None },
        wind_kmh: instant.wind_speed.map(|ms| ms * MS_TO_KMH),
        wind_gust_kmh: instant.wind_speed_of_gust.map(|ms| ms * MS_TO_KMH),
        wind_direction_deg: instant.wind_from_direction,
        cloud_cover_pct: instant.cloud_area_fraction,
        freezing_level_m: None,
        description: block
            .and_then(|b| b.summary.as_ref())
            .map(|s| s.symbol_code.replace('_', " ")),
    })
}

#[derive(Debug, Deserialize)]
struct MetNoResponse {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    timeseries: Vec<TimeseriesEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEntry {
    time: String,
    data: EntryData,
}

#[derive(Debug, Deserialize)]
struct EntryData {
    instant: InstantBlock,
    next_1_hours: Option<PeriodBlock>,
    next_6_hours: Option<PeriodBlock>,
}

#[derive(Debug, Deserialize)]
struct InstantBlock {
    details: InstantDetails,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InstantDetails {
    air_temperature: Option<f64>,
    wind_speed: Option<f64>,
    wind_speed_of_gust: Option<f64>,
    wind_from_direction: Option<f64>,
    cloud_area_fraction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PeriodBlock {
    summary: Option<PeriodSummary>,
    #[serde(default)]
    details: PeriodDetails,
}

#[derive(Debug, Deserialize)]
struct PeriodSummary {
    symbol_code: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PeriodDetails {
    precipitation_amount: Option<f64>,
    probability_of_precipitation: Option<f64>,
}
