//! Solar position from VSOP87.
//!
//! Earth's heliocentric coordinates come from VSOP87D and are turned into
//! the Sun's geocentric declination and the equation of time, the two
//! quantities prayer time calculation needs.
//!
//! Reference: Jean Meeus, "Astronomical Algorithms", Chapters 13, 22, 25, 28.

use chrono::{Datelike, NaiveDate};
use vsop87::vsop87d;

/// Julian Day of J2000.0.
pub const J2000: f64 = 2451545.0;

/// Julian Day at 0h UT of a Gregorian date.
pub fn julian_day(date: NaiveDate) -> f64 {
    let (mut year, mut month) = (date.year() as f64, date.month() as f64);
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }
    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + date.day() as f64 + b
        - 1524.5
}

/// Geocentric ecliptic longitude and latitude of the Sun, in degrees.
pub fn sun_ecliptic(jd: f64) -> (f64, f64) {
    let earth = vsop87d::earth(jd);
    let lon = normalize_degrees(earth.longitude().to_degrees() + 180.0);
    let lat = -earth.latitude().to_degrees();
    (lon, lat)
}

/// Mean obliquity of the ecliptic (Meeus Eq. 22.2, simplified).
pub fn mean_obliquity(jd: f64) -> f64 {
    let t = (jd - J2000) / 36525.0;
    23.439291 - 0.0130042 * t - 1.64e-7 * t * t + 5.04e-7 * t * t * t
}

/// Converts ecliptic to equatorial coordinates.
///
/// Returns (right ascension, declination) in degrees, RA in [0, 360).
pub fn ecliptic_to_equatorial(lon: f64, lat: f64, obliquity: f64) -> (f64, f64) {
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_eps, cos_eps) = obliquity.to_radians().sin_cos();

    // Meeus Eq. 13.3 and 13.4
    let ra = (sin_lon * cos_eps - sin_lat / cos_lat * sin_eps).atan2(cos_lon);
    let dec = (sin_lat * cos_eps + cos_lat * sin_eps * sin_lon).asin();

    (normalize_degrees(ra.to_degrees()), dec.to_degrees())
}

/// Position of the Sun relevant to prayer times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Declination in degrees.
    pub declination: f64,
    /// Equation of time in hours (apparent minus mean solar time).
    pub equation_of_time: f64,
}

/// Declination and equation of time at a Julian Day.
pub fn sun_position(jd: f64) -> SunPosition {
    let (lon, lat) = sun_ecliptic(jd);
    let (ra, declination) = ecliptic_to_equatorial(lon, lat, mean_obliquity(jd));

    // Meeus Eq. 28.1 without nutation; 0.0057183 accounts for aberration.
    let t = (jd - J2000) / 365250.0;
    let mean_longitude = 280.4664567 + 360007.6982779 * t + 0.03032028 * t * t;
    let mut e = normalize_degrees(mean_longitude - 0.0057183 - ra);
    if e > 180.0 {
        e -= 360.0;
    }

    SunPosition { declination, equation_of_time: e / 15.0 }
}

pub(crate) fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}
