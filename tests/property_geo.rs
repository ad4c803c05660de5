use proptest::prelude::*;
use ridgecast::cache::CacheKey;
use ridgecast::geo::{CompassPoint, encode_geohash};

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

proptest! {
    #[test]
    fn compass_point_is_rotation_invariant(degrees in -720.0f64..720.0) {
        let base = CompassPoint::from_degrees(degrees);
        prop_assert_eq!(base, CompassPoint::from_degrees(degrees + 360.0));
        prop_assert_eq!(base, CompassPoint::from_degrees(degrees - 360.0));
    }

    #[test]
    fn compass_point_stays_within_half_a_sector(degrees in 0.0f64..360.0) {
        let point = CompassPoint::from_degrees(degrees);
        let mut distance = (degrees - point.degrees()).abs();
        if distance > 180.0 {
            distance = 360.0 - distance;
        }
        // Eight sectors of 45 degrees each; the centre is never more than
        // half a sector away.
        prop_assert!(distance <= 22.5 + 1e-9);
    }

    #[test]
    fn geohash_is_prefix_stable(
        lat in -90.0f64..90.0,
        lon in -180.0f64..180.0,
        precision in 1usize..8,
    ) {
        let shorter = encode_geohash(lat, lon, precision);
        let longer = encode_geohash(lat, lon, precision + 1);
        prop_assert_eq!(shorter.len(), precision);
        prop_assert!(longer.starts_with(&shorter));
        prop_assert!(longer.chars().all(|c| GEOHASH_ALPHABET.contains(c)));
    }

    #[test]
    fn cache_key_ignores_sub_4dp_jitter(
        lat_e4 in -900_000i32..=900_000,
        lon_e4 in -1_800_000i32..=1_800_000,
        jitter in -0.000_049f64..0.000_049,
    ) {
        let lat = f64::from(lat_e4) / 10_000.0;
        let lon = f64::from(lon_e4) / 10_000.0;
        let exact = CacheKey::new("open-meteo", lat, lon, 7);
        let jittered = CacheKey::new("open-meteo", lat + jitter, lon - jitter, 7);
        prop_assert_eq!(exact, jittered);
    }
}

#[test]
fn compass_degrees_round_trip() {
    for point in [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ] {
        assert_eq!(CompassPoint::from_degrees(point.degrees()), point);
        assert_eq!(CompassPoint::from_abbreviation(point.as_str()), Some(point));
    }
}
