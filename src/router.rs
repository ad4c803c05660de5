use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache::{CacheKey, DEFAULT_TTL_SECS, ForecastCache};
use crate::domain::{NormalizedDailyForecast, WeatherAlert};
use crate::error::{ProviderAttempt, WeatherProviderError};
use crate::providers::{Bom, BrightSky, ForecastProvider, MetNo, Nws, OpenMeteo};

pub const MIN_FORECAST_DAYS: u8 = 1;
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Country-aware forecast orchestrator: resolves the primary provider for a
/// country, applies the TTL cache, and degrades to the universal fallback
/// provider when the primary fails. Construct once and share; holds no
/// global state.
pub struct WeatherRouter {
    providers: HashMap<String, Arc<dyn ForecastProvider>>,
    fallback: Arc<dyn ForecastProvider>,
    cache: ForecastCache,
}

impl WeatherRouter {
    #[must_use]
    pub fn new(
        providers: HashMap<String, Arc<dyn ForecastProvider>>,
        fallback: Arc<dyn ForecastProvider>,
        cache: ForecastCache,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|(country, provider)| (country.to_uppercase(), provider))
            .collect();
        Self {
            providers,
            fallback,
            cache,
        }
    }

    /// The standard registry: national services where we have an adapter,
    /// Open-Meteo everywhere else.
    #[must_use]
    pub fn with_default_providers() -> Self {
        let (providers, fallback) = default_registry();
        Self::new(providers, fallback, ForecastCache::new(DEFAULT_TTL_SECS))
    }

    #[must_use]
    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Primary provider for a country code; unmapped codes resolve straight
    /// to the fallback.
    #[must_use]
    pub fn provider_for(&self, country_code: &str) -> &Arc<dyn ForecastProvider> {
        self.providers
            .get(&country_code.to_uppercase())
            .unwrap_or(&self.fallback)
    }

    /// Fetch a forecast, serving from cache when possible and falling back
    /// to the universal provider when the primary fails. Every forecast
    /// returned has `country_code` and `is_fallback` set; failed fetches
    /// never populate the cache.
    pub async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        country_code: &str,
        days: u8,
    ) -> Result<NormalizedDailyForecast, WeatherProviderError> {
        validate_request(latitude, longitude, days)?;

        let country = country_code.to_uppercase();
        let primary = self.provider_for(&country).clone();

        let key = CacheKey::new(primary.name(), latitude, longitude, days);
        if let Some(cached) = self.cache.get(&key) {
            debug!(provider = primary.name(), country, "forecast cache hit");
            return Ok(cached);
        }

        let primary_error = match primary.forecast(latitude, longitude, days).await {
            Ok(mut forecast) => {
                forecast.country_code = country.clone();
                forecast.is_fallback = false;
                self.cache.insert(key, forecast.clone());
                return Ok(forecast);
            }
            Err(err) => err,
        };

        if primary.name() == self.fallback.name() {
            // The primary was already the provider of last resort.
            error!(country, error = %primary_error, "fallback provider failed, request exhausted");
            return Err(WeatherProviderError::Exhausted {
                country_code: country,
                attempts: vec![ProviderAttempt {
                    provider: primary.name().to_string(),
                    error: primary_error,
                }],
            });
        }

        warn!(
            country,
            primary = primary.name(),
            fallback = self.fallback.name(),
            error = %primary_error,
            "primary provider failed, using fallback"
        );

        // The fallback caches under its own name, so a prior degraded
        // request (or an unmapped-country request for the same point) can
        // serve this one without another upstream call.
        let fallback_key = CacheKey::new(self.fallback.name(), latitude, longitude, days);
        if let Some(mut cached) = self.cache.get(&fallback_key) {
            debug!(provider = self.fallback.name(), country, "fallback cache hit");
            cached.country_code = country;
            cached.is_fallback = true;
            return Ok(cached);
        }

        match self.fallback.forecast(latitude, longitude, days).await {
            Ok(mut forecast) => {
                forecast.country_code = country.clone();
                forecast.is_fallback = true;
                self.cache.insert(fallback_key, forecast.clone());
                Ok(forecast)
            }
            Err(fallback_error) => {
                error!(country, error = %fallback_error, "fallback provider failed, request exhausted");
                Err(WeatherProviderError::Exhausted {
                    country_code: country,
                    attempts: vec![
                        ProviderAttempt {
                            provider: primary.name().to_string(),
                            error: primary_error,
                        },
                        ProviderAttempt {
                            provider: self.fallback.name().to_string(),
                            error: fallback_error,
                        },
                    ],
                })
            }
        }
    }

    /// Active alerts for a point, via the country's resolved provider.
    /// Best-effort: providers without alert support and failed alert calls
    /// both yield an empty list, never an error.
    pub async fn get_alerts(
        &self,
        latitude: f64,
        longitude: f64,
        country_code: &str,
    ) -> Vec<WeatherAlert> {
        let provider = self.provider_for(country_code);
        if !provider.supports_alerts() {
            debug!(
                provider = provider.name(),
                country = country_code,
                "provider has no alert feed, skipping"
            );
            return Vec::new();
        }
        provider.alerts(latitude, longitude).await
    }
}

/// Country map and fallback used by [`WeatherRouter::with_default_providers`],
/// exposed so callers can rebuild the router with their own cache.
#[must_use]
pub fn default_registry() -> (
    HashMap<String, Arc<dyn ForecastProvider>>,
    Arc<dyn ForecastProvider>,
) {
    let nws: Arc<dyn ForecastProvider> = Arc::new(Nws::new());
    let bom: Arc<dyn ForecastProvider> = Arc::new(Bom::new());
    let met_no: Arc<dyn ForecastProvider> = Arc::new(MetNo::new());
    let bright_sky: Arc<dyn ForecastProvider> = Arc::new(BrightSky::new());

    let mut providers: HashMap<String, Arc<dyn ForecastProvider>> = HashMap::new();
    providers.insert("US".to_string(), nws);
    providers.insert("AU".to_string(), bom);
    for country in ["NO", "SE", "DK", "FI", "IS"] {
        providers.insert(country.to_string(), met_no.clone());
    }
    for country in ["DE", "AT"] {
        providers.insert(country.to_string(), bright_sky.clone());
    }

    (providers, Arc::new(OpenMeteo::new()))
}

fn validate_request(latitude: f64, longitude: f64, days: u8) -> Result<(), WeatherProviderError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(WeatherProviderError::InvalidRequest(format!(
            "latitude {latitude} outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(WeatherProviderError::InvalidRequest(format!(
            "longitude {longitude} outside [-180, 180]"
        )));
    }
    if !(MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(WeatherProviderError::InvalidRequest(format!(
            "days {days} outside [{MIN_FORECAST_DAYS}, {MAX_FORECAST_DAYS}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation_bounds() {
        assert!(validate_request(-90.0, 180.0, 1).is_ok());
        assert!(validate_request(90.0, -180.0, 16).is_ok());
        assert!(validate_request(90.1, 0.0, 7).is_err());
        assert!(validate_request(0.0, -180.5, 7).is_err());
        assert!(validate_request(0.0, 0.0, 0).is_err());
        assert!(validate_request(0.0, 0.0, 17).is_err());
    }

    #[test]
    fn default_registry_routes_known_countries() {
        let router = WeatherRouter::with_default_providers();
        assert_eq!(router.provider_for("US").name(), "nws");
        assert_eq!(router.provider_for("au").name(), "bom");
        assert_eq!(router.provider_for("no").name(), "met-no");
        assert_eq!(router.provider_for("DE").name(), "bright-sky");
        assert_eq!(router.provider_for("NZ").name(), "open-meteo");
    }
}
