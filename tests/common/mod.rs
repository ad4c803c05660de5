#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use ridgecast::domain::{
    AlertSeverity, AlertUrgency, ModelElevation, NormalizedDailyForecast, NormalizedForecast,
    WeatherAlert,
};
use ridgecast::error::FetchError;
use ridgecast::geo::CompassPoint;
use ridgecast::providers::ForecastProvider;

/// Scripted provider for router tests: fixed name, optional failure mode,
/// and an upstream call counter.
pub struct MockProvider {
    name: &'static str,
    fail: bool,
    with_alerts: bool,
    pub calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn ok(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            with_alerts: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::ok(name)
        }
    }

    pub fn with_alerts(name: &'static str) -> Self {
        Self {
            with_alerts: true,
            ..Self::ok(name)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports_alerts(&self) -> bool {
        self.with_alerts
    }

    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<NormalizedDailyForecast, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Payload {
                provider: self.name,
                message: "connection refused".to_string(),
            });
        }
        Ok(fixture_forecast(self.name, latitude, longitude, days))
    }

    async fn alerts(&self, _latitude: f64, _longitude: f64) -> Vec<WeatherAlert> {
        if self.with_alerts {
            vec![fixture_alert()]
        } else {
            Vec::new()
        }
    }
}

pub fn fixture_forecast(
    provider: &str,
    latitude: f64,
    longitude: f64,
    days: u8,
) -> NormalizedDailyForecast {
    let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
    let periods = (0..usize::from(days) * 8)
        .map(|i| NormalizedForecast {
            provider: provider.to_string(),
            latitude,
            longitude,
            timestamp: start + Duration::hours(3 * i as i64),
            temp_min_c: 1.0,
            temp_max_c: 4.0,
            rain_chance_pct: 30.0,
            rain_amount_mm: 0.4,
            wind_avg_kmh: 15.0,
            wind_max_kmh: 40.0,
            wind_direction: CompassPoint::W,
            cloud_cover_pct: 70.0,
            freezing_level_m: Some(1600.0),
            snow_amount_cm: 0.0,
            description: "Overcast".to_string(),
            alerts: Vec::new(),
        })
        .collect();

    NormalizedDailyForecast {
        provider: provider.to_string(),
        latitude,
        longitude,
        country_code: String::new(),
        periods,
        alerts: Vec::new(),
        fetched_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
        is_fallback: false,
        model_elevation: ModelElevation::Known(640.0),
    }
}

pub fn fixture_alert() -> WeatherAlert {
    WeatherAlert {
        event: "Winter Storm Warning".to_string(),
        headline: "Heavy snow above 900 m".to_string(),
        severity: AlertSeverity::Severe,
        urgency: AlertUrgency::Expected,
        expires: None,
    }
}
