mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::MockProvider;
use ridgecast::cache::ForecastCache;
use ridgecast::error::WeatherProviderError;
use ridgecast::providers::ForecastProvider;
use ridgecast::router::WeatherRouter;

fn router_with(
    primary: MockProvider,
    country: &str,
    fallback: MockProvider,
) -> (WeatherRouter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let primary_calls = primary.calls.clone();
    let fallback_calls = fallback.calls.clone();

    let mut providers: HashMap<String, Arc<dyn ForecastProvider>> = HashMap::new();
    providers.insert(country.to_string(), Arc::new(primary));

    let router = WeatherRouter::new(providers, Arc::new(fallback), ForecastCache::new(3600));
    (router, primary_calls, fallback_calls)
}

#[tokio::test]
async fn primary_success_is_not_marked_fallback() {
    let (router, primary_calls, fallback_calls) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    let forecast = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    assert_eq!(forecast.provider, "bom");
    assert_eq!(forecast.country_code, "AU");
    assert!(!forecast.is_fallback);
    assert_eq!(forecast.periods.len(), 7 * 8);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_primary_degrades_to_fallback() {
    let (router, primary_calls, fallback_calls) = router_with(
        MockProvider::failing("bom"),
        "AU",
        MockProvider::ok("open-meteo"),
    );

    let forecast = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    assert_eq!(forecast.provider, "open-meteo");
    assert_eq!(forecast.country_code, "AU");
    assert!(forecast.is_fallback);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn country_lookup_is_case_insensitive() {
    let (router, primary_calls, _) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    let forecast = router.get_forecast(-43.15, 146.27, "au", 3).await.unwrap();

    assert_eq!(forecast.provider, "bom");
    assert_eq!(forecast.country_code, "AU");
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unmapped_country_goes_straight_to_fallback() {
    let (router, primary_calls, fallback_calls) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    let forecast = router.get_forecast(47.0, 11.0, "CH", 3).await.unwrap();

    // The fallback is the primary here, so the result is not a degradation.
    assert_eq!(forecast.provider, "open-meteo");
    assert!(!forecast.is_fallback);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeat_request_is_served_from_cache() {
    let (router, primary_calls, _) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    let first = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();
    let second = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.periods.len(), second.periods.len());
    assert_eq!(first.fetched_at, second.fetched_at);
}

#[tokio::test]
async fn cache_key_rounds_coordinates_to_four_decimals() {
    let (router, primary_calls, _) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    router
        .get_forecast(-43.150_04, 146.269_96, "AU", 7)
        .await
        .unwrap();
    router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fallback_result_is_cached_under_fallback_provider() {
    let (router, primary_calls, fallback_calls) = router_with(
        MockProvider::failing("bom"),
        "AU",
        MockProvider::ok("open-meteo"),
    );

    router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();
    let again = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    // Second call retries the primary (its failure was never cached) and
    // then hits the cached fallback entry.
    assert!(again.is_fallback);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn degraded_request_reuses_an_unmapped_country_cache_entry() {
    let (router, primary_calls, fallback_calls) = router_with(
        MockProvider::failing("bom"),
        "AU",
        MockProvider::ok("open-meteo"),
    );

    // Same point, unmapped country: fills the cache under the fallback name.
    let direct = router.get_forecast(-43.15, 146.27, "CH", 7).await.unwrap();
    assert!(!direct.is_fallback);

    let degraded = router.get_forecast(-43.15, 146.27, "AU", 7).await.unwrap();

    assert_eq!(degraded.provider, "open-meteo");
    assert_eq!(degraded.country_code, "AU");
    assert!(degraded.is_fallback);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn double_failure_reports_both_attempts_and_caches_nothing() {
    let (router, ..) = router_with(
        MockProvider::failing("bom"),
        "AU",
        MockProvider::failing("open-meteo"),
    );

    let err = router
        .get_forecast(-43.15, 146.27, "AU", 7)
        .await
        .unwrap_err();

    match err {
        WeatherProviderError::Exhausted {
            country_code,
            attempts,
        } => {
            assert_eq!(country_code, "AU");
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].provider, "bom");
            assert_eq!(attempts[1].provider, "open-meteo");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(router.cache().stats().entries, 0);
}

#[tokio::test]
async fn failing_fallback_as_primary_reports_single_attempt() {
    let (router, _, fallback_calls) = router_with(
        MockProvider::ok("bom"),
        "AU",
        MockProvider::failing("open-meteo"),
    );

    let err = router.get_forecast(51.5, -0.12, "GB", 3).await.unwrap_err();

    match err {
        WeatherProviderError::Exhausted { attempts, .. } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].provider, "open-meteo");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_request_is_rejected_before_any_fetch() {
    let (router, primary_calls, fallback_calls) =
        router_with(MockProvider::ok("bom"), "AU", MockProvider::ok("open-meteo"));

    let err = router.get_forecast(-91.0, 146.27, "AU", 7).await.unwrap_err();
    assert!(matches!(err, WeatherProviderError::InvalidRequest(_)));

    let err = router.get_forecast(-43.15, 146.27, "AU", 0).await.unwrap_err();
    assert!(matches!(err, WeatherProviderError::InvalidRequest(_)));

    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn alerts_skip_providers_without_alert_feeds() {
    let (router, ..) = router_with(
        MockProvider::with_alerts("nws"),
        "US",
        MockProvider::ok("open-meteo"),
    );

    let us = router.get_alerts(39.74, -104.98, "US").await;
    assert_eq!(us.len(), 1);
    assert_eq!(us[0].event, "Winter Storm Warning");

    let elsewhere = router.get_alerts(47.0, 11.0, "CH").await;
    assert!(elsewhere.is_empty());
}
