//! Qibla direction.
//!
//! Great-circle initial bearing from the observer to the Kaaba.

use miqat_types::Location;

use crate::solar::normalize_degrees;

/// Latitude of the Kaaba, Makkah.
pub const KAABA_LAT: f64 = 21.4225;
/// Longitude of the Kaaba, Makkah.
pub const KAABA_LNG: f64 = 39.8262;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Bearing in degrees clockwise from true north, in [0, 360).
///
/// Undefined at the Kaaba itself; returns 0 there.
pub fn qibla_bearing(location: &Location) -> f64 {
    let phi = location.lat.to_radians();
    let phi_k = KAABA_LAT.to_radians();
    let delta = (KAABA_LNG - location.lng).to_radians();

    let y = delta.sin();
    let x = phi.cos() * phi_k.tan() - phi.sin() * delta.cos();
    if x.abs() < f64::EPSILON && y.abs() < f64::EPSILON {
        return 0.0;
    }

    let bearing = normalize_degrees(y.atan2(x).to_degrees());
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Haversine distance to the Kaaba in kilometres.
pub fn distance_to_kaaba_km(location: &Location) -> f64 {
    let phi1 = location.lat.to_radians();
    let phi2 = KAABA_LAT.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (KAABA_LNG - location.lng).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use miqat_types::Tz;

    fn at(lat: f64, lng: f64) -> Location {
        Location::new_unchecked(lat, lng, Tz::UTC)
    }

    #[test]
    fn test_known_bearings() {
        let cases = [
            ((33.9114, -84.2614), 52.38), // Doraville, GA
            ((40.7128, -74.0060), 58.48), // New York
            ((51.5074, -0.1278), 118.99), // London
            ((-6.2088, 106.8456), 295.15), // Jakarta
        ];
        for ((lat, lng), expected) in cases {
            let bearing = qibla_bearing(&at(lat, lng));
            assert!((bearing - expected).abs() < 0.5, "({lat}, {lng}) -> {bearing}");
        }
    }

    #[test]
    fn test_bearing_range() {
        for lat in (-89..=89).step_by(7) {
            for lng in (-180..180).step_by(13) {
                let b = qibla_bearing(&at(lat as f64, lng as f64));
                assert!((0.0..360.0).contains(&b), "{b}");
            }
        }
    }

    #[test]
    fn test_due_directions() {
        // Same meridian, south of Makkah: due north.
        assert!(qibla_bearing(&at(0.0, KAABA_LNG)) < 0.01);
        // Same meridian, north of Makkah: due south.
        assert!((qibla_bearing(&at(45.0, KAABA_LNG)) - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_distance() {
        assert!(distance_to_kaaba_km(&at(KAABA_LAT, KAABA_LNG)) < 1e-6);
        let ny = distance_to_kaaba_km(&at(40.7128, -74.0060));
        assert!((ny - 10_300.0).abs() < 100.0, "{ny}");
    }
}
