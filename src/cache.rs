use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::domain::NormalizedDailyForecast;

/// Default entry lifetime, seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Time source, injectable so expiry boundaries are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cache key with latitude/longitude bucketed to 4 decimal places (~11 m)
/// and stored as fixed-point integers, so equality and hashing never depend
/// on float formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    provider: String,
    lat_e4: i32,
    lon_e4: i32,
    days: u8,
}

impl CacheKey {
    #[must_use]
    pub fn new(provider: &str, latitude: f64, longitude: f64, days: u8) -> Self {
        Self {
            provider: provider.to_string(),
            lat_e4: bucket_e4(latitude),
            lon_e4: bucket_e4(longitude),
            days,
        }
    }

    fn matches_location(&self, provider: &str, latitude: f64, longitude: f64) -> bool {
        self.provider == provider
            && self.lat_e4 == bucket_e4(latitude)
            && self.lon_e4 == bucket_e4(longitude)
    }
}

fn bucket_e4(value: f64) -> i32 {
    (value * 10_000.0).round() as i32
}

#[derive(Debug, Clone)]
struct CacheEntry {
    forecast: NormalizedDailyForecast,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Per-process TTL cache for normalized forecasts.
///
/// Entries are immutable once stored and are replaced wholesale when they
/// expire. The read-miss-fetch-store sequence is not single-flighted: two
/// concurrent requests for the same key can both miss and both fetch
/// upstream. The staleness bound equals the TTL.
pub struct ForecastCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ForecastCache {
    #[must_use]
    pub fn new(ttl_secs: i64) -> Self {
        Self::with_clock(ttl_secs, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
            clock,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached forecast for `key`, if present and not expired. An expired
    /// entry is evicted on the way out.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<NormalizedDailyForecast> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.forecast.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, forecast: NormalizedDailyForecast) {
        let expires_at = self.clock.now() + self.ttl;
        self.lock().insert(
            key,
            CacheEntry {
                forecast,
                expires_at,
            },
        );
    }

    /// Drop every `days` variant cached for this provider and location.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, provider: &str, latitude: f64, longitude: f64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.matches_location(provider, latitude, longitude));
        before - entries.len()
    }

    /// Full sweep of expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.lock();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            entries: entries.len(),
            valid: entries.len() - expired,
            expired,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
