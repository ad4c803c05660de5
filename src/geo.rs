use serde::{Deserialize, Serialize};

const GEOHASH_BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode latitude/longitude into a geohash of the given precision.
///
/// Precision 5 buckets points into ~5 km cells, precision 6 into ~1.2 km
/// cells (the resolution the BoM API addresses forecast locations at).
#[must_use]
pub fn encode_geohash(lat: f64, lon: f64, precision: usize) -> String {
    let mut geohash = String::with_capacity(precision);
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut is_even = true;
    let mut bit = 0;
    let mut ch: u8 = 0;

    while geohash.len() < precision {
        if is_even {
            let mid = (lon_range.0 + lon_range.1) / 2.0;
            if lon > mid {
                ch |= 1 << (4 - bit);
                lon_range.0 = mid;
            } else {
                lon_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if lat > mid {
                ch |= 1 << (4 - bit);
                lat_range.0 = mid;
            } else {
                lat_range.1 = mid;
            }
        }

        is_even = !is_even;

        if bit < 4 {
            bit += 1;
        } else {
            geohash.push(GEOHASH_BASE32[ch as usize] as char);
            bit = 0;
            ch = 0;
        }
    }

    geohash
}

/// 8-point compass direction for wind reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        match (normalized / 45.0).round() as u32 % 8 {
            0 => CompassPoint::N,
            1 => CompassPoint::NE,
            2 => CompassPoint::E,
            3 => CompassPoint::SE,
            4 => CompassPoint::S,
            5 => CompassPoint::SW,
            6 => CompassPoint::W,
            _ => CompassPoint::NW,
        }
    }

    /// Parse a provider-reported compass abbreviation. 16-point names sit
    /// exactly between two 8-point sectors, so they collapse clockwise onto
    /// the next point (NNE becomes NE, WNW becomes NW, NNW wraps to N).
    #[must_use]
    pub fn from_abbreviation(value: &str) -> Option<Self> {
        let point = match value.to_uppercase().as_str() {
            "N" | "NNW" => CompassPoint::N,
            "NNE" | "NE" => CompassPoint::NE,
            "ENE" | "E" => CompassPoint::E,
            "ESE" | "SE" => CompassPoint::SE,
            "SSE" | "S" => CompassPoint::S,
            "SSW" | "SW" => CompassPoint::SW,
            "WSW" | "W" => CompassPoint::W,
            "WNW" | "NW" => CompassPoint::NW,
            _ => return None,
        };
        Some(point)
    }

    #[must_use]
    pub fn degrees(self) -> f64 {
        match self {
            CompassPoint::N => 0.0,
            CompassPoint::NE => 45.0,
            CompassPoint::E => 90.0,
            CompassPoint::SE => 135.0,
            CompassPoint::S => 180.0,
            CompassPoint::SW => 225.0,
            CompassPoint::W => 270.0,
            CompassPoint::NW => 315.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geohash_matches_known_cities() {
        // Reference hashes from the BoM location table.
        assert_eq!(encode_geohash(-33.8688, 151.2093, 6), "r3gx2f");
        assert_eq!(encode_geohash(-37.8136, 144.9631, 6), "r1r0fs");
        assert_eq!(encode_geohash(-33.8688, 151.2093, 5), "r3gx2");
    }

    #[test]
    fn geohash_precision_controls_length() {
        for precision in 1..=8 {
            assert_eq!(encode_geohash(48.2082, 16.3738, precision).len(), precision);
        }
    }

    #[test]
    fn compass_cardinal_points() {
        assert_eq!(CompassPoint::from_degrees(0.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(90.0), CompassPoint::E);
        assert_eq!(CompassPoint::from_degrees(180.0), CompassPoint::S);
        assert_eq!(CompassPoint::from_degrees(270.0), CompassPoint::W);
        assert_eq!(CompassPoint::from_degrees(359.0), CompassPoint::N);
    }

    #[test]
    fn compass_rounds_to_nearest_point() {
        assert_eq!(CompassPoint::from_degrees(22.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_degrees(23.0), CompassPoint::NE);
        assert_eq!(CompassPoint::from_degrees(-45.0), CompassPoint::NW);
    }

    #[test]
    fn sixteen_point_names_collapse_clockwise() {
        assert_eq!(
            CompassPoint::from_abbreviation("NNE"),
            Some(CompassPoint::NE)
        );
        assert_eq!(
            CompassPoint::from_abbreviation("WNW"),
            Some(CompassPoint::NW)
        );
        assert_eq!(
            CompassPoint::from_abbreviation("NNW"),
            Some(CompassPoint::N)
        );
        assert_eq!(
            CompassPoint::from_abbreviation("wsw"),
            Some(CompassPoint::W)
        );
        assert_eq!(CompassPoint::from_abbreviation("calm"), None);
    }
}
