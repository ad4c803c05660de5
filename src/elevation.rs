use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;
use crate::geo::encode_geohash;

const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";
const PROVIDER: &str = "open-elevation";

/// Grid dimension: 7x7 = 49 samples per terrain cell.
const GRID_DIM: usize = 7;
/// Half-widths of the sampling box, degrees. Roughly 2.2 km north-south by
/// 2.5 km east-west at mid latitudes.
const HALF_LAT_DEG: f64 = 0.01;
const HALF_LON_DEG: f64 = 0.0125;
/// The bulk endpoint accepts at most this many points per call.
const MAX_BATCH: usize = 100;
/// 5 characters buckets the cache at ~5 km, matching the terrain cell size.
const CACHE_GEOHASH_PRECISION: usize = 5;

/// Environmental lapse rate used for temperature reprojection, degrees C
/// per metre.
pub const LAPSE_RATE_C_PER_M: f64 = 0.0065;

/// Grid-averaged elevation for the terrain cell around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridElevation {
    pub average_m: f64,
    pub min_m: f64,
    pub max_m: f64,
    /// Number of grid samples that resolved. Zero means the whole grid and
    /// the single-point fallback failed and the average defaulted to 0.
    pub samples: usize,
}

/// Resolves the average terrain elevation a forecast cell covers, so model
/// temperatures can be reprojected to the user's point elevation.
///
/// Results are cached by 5-character geohash with no TTL: terrain does not
/// change. `clear_cache` exists for test isolation.
pub struct ElevationResolver {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<String, GridElevation>>,
}

impl Default for ElevationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(OPEN_ELEVATION_URL)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
            base_url: base_url.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Average elevation of the cell centred on the point. Never fails:
    /// degraded lookups fall back to a single-point query, then to 0.
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> GridElevation {
        let cache_key = encode_geohash(latitude, longitude, CACHE_GEOHASH_PRECISION);
        if let Some(cached) = self.lock().get(&cache_key).copied() {
            return cached;
        }

        let resolved = self.resolve_uncached(latitude, longitude).await;
        self.lock().insert(cache_key, resolved);
        resolved
    }

    async fn resolve_uncached(&self, latitude: f64, longitude: f64) -> GridElevation {
        let points = grid_points(latitude, longitude);
        let elevations = match self.bulk_lookup(&points).await {
            Ok(values) => values.into_iter().flatten().collect::<Vec<f64>>(),
            Err(err) => {
                warn!(error = %err, "bulk elevation lookup failed");
                Vec::new()
            }
        };

        if !elevations.is_empty() {
            let sum: f64 = elevations.iter().sum();
            let min = elevations.iter().copied().fold(f64::INFINITY, f64::min);
            let max = elevations
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            return GridElevation {
                average_m: sum / elevations.len() as f64,
                min_m: min,
                max_m: max,
                samples: elevations.len(),
            };
        }

        // Whole grid failed; a single-point lookup is better than nothing.
        match self.point_lookup(latitude, longitude).await {
            Some(elevation) => GridElevation {
                average_m: elevation,
                min_m: elevation,
                max_m: elevation,
                samples: 1,
            },
            None => {
                warn!(
                    latitude,
                    longitude, "all elevation lookups failed, defaulting to sea level"
                );
                GridElevation {
                    average_m: 0.0,
                    min_m: 0.0,
                    max_m: 0.0,
                    samples: 0,
                }
            }
        }
    }

    /// Batched point lookups, at most `MAX_BATCH` points per call, results
    /// in input order.
    async fn bulk_lookup(&self, points: &[(f64, f64)]) -> Result<Vec<Option<f64>>, FetchError> {
        let batches = points
            .chunks(MAX_BATCH)
            .map(|chunk| self.lookup_batch(chunk));
        let results = try_join_all(batches).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn lookup_batch(&self, points: &[(f64, f64)]) -> Result<Vec<Option<f64>>, FetchError> {
        let locations: Vec<LocationRequest> = points
            .iter()
            .map(|&(latitude, longitude)| LocationRequest {
                latitude,
                longitude,
            })
            .collect();

        let response = self
            .client
            .post(&self.base_url)
            .json(&BulkRequest { locations })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let payload: BulkResponse = response.json().await.map_err(|err| FetchError::Decode {
            provider: PROVIDER,
            message: err.to_string(),
        })?;

        Ok(payload.results.into_iter().map(|r| r.elevation).collect())
    }

    async fn point_lookup(&self, latitude: f64, longitude: f64) -> Option<f64> {
        match self.lookup_batch(&[(latitude, longitude)]).await {
            Ok(values) => values.first().copied().flatten(),
            Err(err) => {
                warn!(error = %err, "single-point elevation lookup failed");
                None
            }
        }
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, GridElevation>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Adjustment to add to a model temperature valid at `cell_average_m` to
/// estimate the temperature at `point_elevation_m`, using the standard
/// lapse rate.
#[must_use]
pub fn temperature_adjustment(point_elevation_m: f64, cell_average_m: f64) -> f64 {
    (point_elevation_m - cell_average_m) * LAPSE_RATE_C_PER_M
}

/// The 7x7 sample grid spanning the bounding box around a point.
fn grid_points(latitude: f64, longitude: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(GRID_DIM * GRID_DIM);
    let steps = (GRID_DIM - 1) as f64;
    for row in 0..GRID_DIM {
        let lat = latitude - HALF_LAT_DEG + 2.0 * HALF_LAT_DEG * row as f64 / steps;
        for col in 0..GRID_DIM {
            let lon = longitude - HALF_LON_DEG + 2.0 * HALF_LON_DEG * col as f64 / steps;
            points.push((lat, lon));
        }
    }
    points
}

#[derive(Debug, Serialize)]
struct BulkRequest {
    locations: Vec<LocationRequest>,
}

#[derive(Debug, Serialize)]
struct LocationRequest {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    results: Vec<LocationResult>,
}

#[derive(Debug, Deserialize)]
struct LocationResult {
    elevation: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lapse_rate_adjustment() {
        let adjustment = temperature_adjustment(1200.0, 500.0);
        assert!((adjustment - 4.55).abs() < 1e-9);
        assert_eq!(temperature_adjustment(500.0, 500.0), 0.0);
        assert!(temperature_adjustment(0.0, 500.0) < 0.0);
    }

    #[test]
    fn grid_covers_the_bounding_box() {
        let points = grid_points(-43.15, 146.27);
        assert_eq!(points.len(), 49);

        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert!((first.0 - (-43.16)).abs() < 1e-9);
        assert!((first.1 - 146.2575).abs() < 1e-9);
        assert!((last.0 - (-43.14)).abs() < 1e-9);
        assert!((last.1 - 146.2825).abs() < 1e-9);

        // Centre of the grid is the query point itself.
        assert!((points[24].0 - (-43.15)).abs() < 1e-9);
        assert!((points[24].1 - 146.27).abs() < 1e-9);
    }
}
