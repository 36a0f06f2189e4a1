//! Prayer Times Calculation Module.
//!
//! Computes all daily times from the Sun's declination and the equation of
//! time. Each event is the hour angle at which the Sun reaches a target
//! altitude; the calculation runs twice, the second pass re-evaluating the
//! Sun at the first pass's estimates.
//!
//! Intermediate values are hours of local mean solar time at the
//! observer's longitude. An event whose altitude is never reached is `NaN`
//! until the high-latitude rules fill it in.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use miqat_types::{HighLatitudeRule, Location, MethodParams, MidnightMode, MiqatError, RawTimes, TwilightRule};

use crate::solar::{julian_day, sun_position};

/// Latitude at which polar days and nights are recomputed.
pub const POLAR_LATITUDE: f64 = 65.0;
/// Reference latitude for [`HighLatitudeRule::NearestLatitude`].
pub const NEAREST_LATITUDE: f64 = 48.5;

const PASSES: usize = 2;

/// Hours of local mean time for each event.
#[derive(Debug, Clone, Copy)]
struct DayHours {
    fajr: f64,
    sunrise: f64,
    dhuhr: f64,
    asr: f64,
    sunset: f64,
    maghrib: f64,
    isha: f64,
}

impl DayHours {
    const INITIAL: Self = Self {
        fajr: 5.0,
        sunrise: 6.0,
        dhuhr: 12.0,
        asr: 13.0,
        sunset: 18.0,
        maghrib: 18.0,
        isha: 18.0,
    };
}

/// Sun geometry for one day at one latitude.
struct Solver<'a> {
    /// Julian Day of 0h local mean time.
    jd: f64,
    lat: f64,
    rise_set_angle: f64,
    params: &'a MethodParams,
}

impl<'a> Solver<'a> {
    fn new(date: NaiveDate, lng: f64, lat: f64, elevation: f64, params: &'a MethodParams) -> Self {
        Self {
            jd: julian_day(date) - lng / (15.0 * 24.0),
            lat,
            // Refraction plus solar semi-diameter, with horizon dip for elevated observers.
            rise_set_angle: 0.833 + 0.0347 * elevation.max(0.0).sqrt(),
            params,
        }
    }

    fn solar_noon(&self, hours: f64) -> f64 {
        let eqt = sun_position(self.jd + hours / 24.0).equation_of_time;
        fix_hour(12.0 - eqt)
    }

    /// Time at which the Sun is `angle` degrees below the horizon.
    /// `ccw` selects the morning side of noon.
    fn sun_angle_time(&self, angle: f64, hours: f64, ccw: bool) -> f64 {
        let pos = sun_position(self.jd + hours / 24.0);
        let noon = fix_hour(12.0 - pos.equation_of_time);
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_dec, cos_dec) = pos.declination.to_radians().sin_cos();

        let cos_h = (-angle.to_radians().sin() - sin_dec * sin_lat) / (cos_dec * cos_lat);
        if !(-1.0..=1.0).contains(&cos_h) {
            return f64::NAN;
        }
        let t = cos_h.acos().to_degrees() / 15.0;
        if ccw { noon - t } else { noon + t }
    }

    fn asr_time(&self, hours: f64) -> f64 {
        let dec = sun_position(self.jd + hours / 24.0).declination;
        let factor = self.params.asr_school.shadow_factor();
        let altitude = (1.0 / (factor + (self.lat - dec).abs().to_radians().tan())).atan().to_degrees();
        self.sun_angle_time(-altitude, hours, false)
    }

    fn pass(&self, prev: &DayHours) -> DayHours {
        let guess = |value: f64, fallback: f64| if value.is_nan() { fallback } else { value };
        let init = DayHours::INITIAL;

        let sunset = self.sun_angle_time(self.rise_set_angle, guess(prev.sunset, init.sunset), false);
        DayHours {
            fajr: self.sun_angle_time(self.params.fajr_angle, guess(prev.fajr, init.fajr), true),
            sunrise: self.sun_angle_time(self.rise_set_angle, guess(prev.sunrise, init.sunrise), true),
            dhuhr: self.solar_noon(guess(prev.dhuhr, init.dhuhr)),
            asr: self.asr_time(guess(prev.asr, init.asr)),
            sunset,
            maghrib: match self.params.maghrib {
                TwilightRule::Angle(a) => self.sun_angle_time(a, guess(prev.maghrib, init.maghrib), false),
                TwilightRule::MinutesAfter(_) => sunset,
            },
            isha: match self.params.isha {
                TwilightRule::Angle(a) => self.sun_angle_time(a, guess(prev.isha, init.isha), false),
                TwilightRule::MinutesAfter(_) => sunset,
            },
        }
    }

    fn compute(&self) -> DayHours {
        (0..PASSES).fold(DayHours::INITIAL, |prev, _| self.pass(&prev))
    }
}

/// Calculates prayer times for a given date and location.
///
/// # Arguments
/// * `date` - The Gregorian date
/// * `location` - Observer position; its time zone is not used here
/// * `params` - Twilight angles, Asr school and high-latitude rule
///
/// # Returns
/// Instants in UTC, ordered Fajr < Sunrise < Dhuhr < Asr < Maghrib < Isha.
///
/// # Errors
/// `InvalidInput` for bad coordinates, `Calculation` for bad parameters or
/// when no defined schedule can be produced.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use miqat_types::{CalculationMethod, Location, Tz};
/// use miqat_astronomy::prayer::calculate_prayer_times;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let jakarta = Location::new(-6.2088, 106.8456, Tz::Asia__Jakarta).unwrap();
/// let params = CalculationMethod::Mabims.params().unwrap();
///
/// let times = calculate_prayer_times(date, &jakarta, &params).unwrap();
/// assert!(times.is_ordered());
/// ```
pub fn calculate_prayer_times(
    date: NaiveDate,
    location: &Location,
    params: &MethodParams,
) -> Result<RawTimes, MiqatError> {
    location.validate()?;
    params.validate()?;

    if let Some(times) = times_at(date, location.lng, location.lat, location.elevation, params) {
        return Ok(times);
    }

    // Polar day or night, or a Sun too low for a usable schedule: recompute
    // at sea level, no further poleward than the polar latitude.
    let lat = location.lat.abs().min(POLAR_LATITUDE).copysign(location.lat);
    times_at(date, location.lng, lat, 0.0, params).ok_or_else(|| {
        MiqatError::Calculation(format!("No defined prayer times at latitude {:.2} on {}", location.lat, date))
    })
}

/// Full schedule as seen from `lat` and `elevation`, or `None` when some
/// event stays undefined or the events come out of order.
fn times_at(date: NaiveDate, lng: f64, lat: f64, elevation: f64, params: &MethodParams) -> Option<RawTimes> {
    let mut hours = Solver::new(date, lng, lat, elevation, params).compute();

    if params.high_latitude_rule == HighLatitudeRule::NearestLatitude
        && lat.abs() > NEAREST_LATITUDE
        && (hours.fajr.is_nan() || hours.isha.is_nan() || hours.maghrib.is_nan())
    {
        // Twilight durations of the reference latitude, hung on our own sunrise and sunset.
        let nearest = Solver::new(date, lng, NEAREST_LATITUDE.copysign(lat), elevation, params).compute();
        if hours.fajr.is_nan() {
            hours.fajr = hours.sunrise - (nearest.sunrise - nearest.fajr);
        }
        if hours.maghrib.is_nan() {
            hours.maghrib = hours.sunset + (nearest.maghrib - nearest.sunset);
        }
        if hours.isha.is_nan() {
            hours.isha = hours.sunset + (nearest.isha - nearest.sunset);
        }
    }

    adjust_high_latitudes(&mut hours, params);

    let imsak = hours.fajr - params.imsak_minutes / 60.0;
    match params.maghrib {
        TwilightRule::MinutesAfter(m) => hours.maghrib = hours.sunset + m / 60.0,
        // A shallow angle can lie inside an elevated observer's horizon dip.
        TwilightRule::Angle(_) => hours.maghrib = hours.maghrib.max(hours.sunset),
    }
    match (params.maghrib, params.isha) {
        (_, TwilightRule::MinutesAfter(m)) => hours.isha = hours.maghrib + m / 60.0,
        // Both clamped to the same portion of the night: split it by angle.
        (TwilightRule::Angle(m), TwilightRule::Angle(i)) if hours.maghrib >= hours.isha => {
            hours.maghrib = hours.sunset + (hours.isha - hours.sunset) * m / i;
        }
        _ => {}
    }
    hours.dhuhr += params.dhuhr_offset_minutes / 60.0;

    let midnight = match params.midnight {
        MidnightMode::Standard => hours.sunset + night_length(hours.sunset, hours.sunrise) / 2.0,
        MidnightMode::Jafari => hours.sunset + night_length(hours.sunset, hours.fajr) / 2.0,
    };

    let all = [
        imsak, hours.fajr, hours.sunrise, hours.dhuhr, hours.asr, hours.sunset, hours.maghrib, hours.isha, midnight,
    ];
    if all.iter().any(|h| !h.is_finite()) {
        return None;
    }

    let at = |h: f64| to_utc(date, h - lng / 15.0);
    let times = RawTimes {
        imsak: at(imsak),
        fajr: at(hours.fajr),
        sunrise: at(hours.sunrise),
        dhuhr: at(hours.dhuhr),
        asr: at(hours.asr),
        sunset: at(hours.sunset),
        maghrib: at(hours.maghrib),
        isha: at(hours.isha),
        midnight: at(midnight),
    };
    (times.is_ordered() && times.sunset <= times.maghrib).then_some(times)
}

/// Bounds Fajr and Isha (and an angle-based Maghrib) by a portion of the night.
fn adjust_high_latitudes(hours: &mut DayHours, params: &MethodParams) {
    let night = night_length(hours.sunset, hours.sunrise);
    let rule = params.high_latitude_rule;

    hours.fajr = adjust_time(hours.fajr, hours.sunrise, params.fajr_angle, night, rule, true);
    if let TwilightRule::Angle(a) = params.isha {
        hours.isha = adjust_time(hours.isha, hours.sunset, a, night, rule, false);
    }
    if let TwilightRule::Angle(a) = params.maghrib {
        hours.maghrib = adjust_time(hours.maghrib, hours.sunset, a, night, rule, false);
    }
}

fn adjust_time(time: f64, base: f64, angle: f64, night: f64, rule: HighLatitudeRule, ccw: bool) -> f64 {
    let portion = night
        * match rule {
            HighLatitudeRule::None | HighLatitudeRule::MiddleOfNight | HighLatitudeRule::NearestLatitude => 0.5,
            HighLatitudeRule::OneSeventh => 1.0 / 7.0,
            HighLatitudeRule::AngleBased => angle / 60.0,
        };
    let diff = if ccw { base - time } else { time - base };
    // `None` only fills undefined times.
    let clamp = rule != HighLatitudeRule::None;

    if time.is_nan() || (clamp && diff > portion) {
        if ccw { base - portion } else { base + portion }
    } else {
        time
    }
}

/// Hours from an evening event to a morning event.
fn night_length(evening: f64, morning: f64) -> f64 {
    fix_hour(morning - evening)
}

fn fix_hour(hours: f64) -> f64 {
    hours.rem_euclid(24.0)
}

fn to_utc(date: NaiveDate, hours: f64) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    midnight + Duration::seconds((hours * 3600.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use miqat_types::{AsrSchool, CalculationMethod, Tz};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doraville() -> Location {
        Location::new_unchecked(33.9114, -84.2614, Tz::America__New_York)
    }

    #[test]
    fn test_prayer_times_doraville_isna() {
        let params = CalculationMethod::Isna.params().unwrap();
        let times = calculate_prayer_times(date(2025, 1, 15), &doraville(), &params).unwrap();

        assert!(times.is_ordered());
        // Solar noon there is about 12:46 EST, i.e. 17:46 UTC.
        assert_eq!(times.dhuhr.hour(), 17);
        assert!(times.imsak < times.fajr);
        assert!(times.sunset <= times.maghrib);
        assert!(times.midnight > times.isha);
    }

    #[test]
    fn test_prayer_times_mecca_deterministic() {
        let mecca = Location::new_unchecked(21.4225, 39.8262, Tz::Asia__Riyadh);
        let params = CalculationMethod::UmmAlQura.params().unwrap();
        let a = calculate_prayer_times(date(2024, 6, 15), &mecca, &params).unwrap();
        let b = calculate_prayer_times(date(2024, 6, 15), &mecca, &params).unwrap();
        assert_eq!(a, b);
        assert_eq!((a.isha - a.maghrib).num_minutes(), 90);
    }

    #[test]
    fn test_imsak_buffer() {
        let coords = Location::new_unchecked(0.0, 106.0, Tz::Asia__Jakarta);
        let params = MethodParams { imsak_minutes: 10.0, ..Default::default() };
        let times = calculate_prayer_times(date(2024, 3, 15), &coords, &params).unwrap();
        assert_eq!((times.fajr - times.imsak).num_minutes(), 10);
    }

    #[test]
    fn test_hanafi_asr_is_later() {
        let standard = CalculationMethod::Karachi.params().unwrap();
        let hanafi = standard.with_asr_school(AsrSchool::Hanafi);
        let a = calculate_prayer_times(date(2024, 3, 15), &doraville(), &standard).unwrap();
        let b = calculate_prayer_times(date(2024, 3, 15), &doraville(), &hanafi).unwrap();
        assert!(b.asr > a.asr);
        assert_eq!(a.fajr, b.fajr);
    }

    #[test]
    fn test_elevation_widens_day() {
        let params = MethodParams::default();
        let sea = doraville();
        let hill = sea.with_elevation(1500.0);
        let a = calculate_prayer_times(date(2024, 3, 15), &sea, &params).unwrap();
        let b = calculate_prayer_times(date(2024, 3, 15), &hill, &params).unwrap();
        assert!(b.sunrise < a.sunrise);
        assert!(b.sunset > a.sunset);
    }

    #[test]
    fn test_high_latitude_summer_is_defined() {
        let oslo = Location::new_unchecked(59.9139, 10.7522, Tz::Europe__Oslo);
        for rule in [
            HighLatitudeRule::None,
            HighLatitudeRule::MiddleOfNight,
            HighLatitudeRule::OneSeventh,
            HighLatitudeRule::AngleBased,
            HighLatitudeRule::NearestLatitude,
        ] {
            let params = MethodParams::default().with_high_latitude_rule(rule);
            let times = calculate_prayer_times(date(2024, 6, 21), &oslo, &params).unwrap();
            assert!(times.is_ordered(), "{:?}", rule);
        }
    }

    #[test]
    fn test_polar_day_and_night() {
        let tromso = Location::new_unchecked(69.6492, 18.9553, Tz::Europe__Oslo);
        let params = MethodParams::default();
        for d in [date(2024, 6, 21), date(2024, 12, 1)] {
            let times = calculate_prayer_times(d, &tromso, &params).unwrap();
            assert!(times.is_ordered(), "{}", d);
        }
    }

    #[test]
    fn test_polar_day_at_altitude() {
        let tromso = Location::new_unchecked(69.6492, 18.9553, Tz::Europe__Oslo).with_elevation(1000.0);
        for method in [CalculationMethod::MuslimWorldLeague, CalculationMethod::Tehran, CalculationMethod::UmmAlQura] {
            let times = calculate_prayer_times(date(2024, 6, 21), &tromso, &method.params().unwrap()).unwrap();
            assert!(times.is_ordered(), "{:?}", method);
        }
    }

    #[test]
    fn test_high_summit_below_polar_circle() {
        // At 9000 m the horizon dip keeps the Sun up all night at 64°N.
        let summit = Location::new_unchecked(64.0, -150.0, Tz::America__Anchorage).with_elevation(9000.0);
        let params = MethodParams::default();
        let times = calculate_prayer_times(date(2024, 6, 21), &summit, &params).unwrap();
        let sea_level = calculate_prayer_times(date(2024, 6, 21), &summit.with_elevation(0.0), &params).unwrap();
        assert!(times.is_ordered());
        assert_eq!(times, sea_level);
    }

    #[test]
    fn test_southern_polar_night_every_rule() {
        let station = Location::new_unchecked(-77.85, 166.67, Tz::Antarctica__McMurdo).with_elevation(2500.0);
        for rule in [
            HighLatitudeRule::None,
            HighLatitudeRule::MiddleOfNight,
            HighLatitudeRule::OneSeventh,
            HighLatitudeRule::AngleBased,
            HighLatitudeRule::NearestLatitude,
        ] {
            for method in [CalculationMethod::Jafari, CalculationMethod::Mabims] {
                let params = method.params().unwrap().with_high_latitude_rule(rule);
                let times = calculate_prayer_times(date(2024, 6, 21), &station, &params).unwrap();
                assert!(times.is_ordered(), "{:?} {:?}", method, rule);
                assert!(times.sunset <= times.maghrib, "{:?} {:?}", method, rule);
            }
        }
    }

    #[test]
    fn test_grazing_winter_sun_keeps_asr_after_dhuhr() {
        // Near 66.5°N in late December the Sun barely clears the horizon at noon.
        let params = MethodParams::default();
        for lat in [66.3, 66.5, 66.7, 67.2] {
            let place = Location::new_unchecked(lat, 25.0, Tz::Europe__Helsinki);
            let times = calculate_prayer_times(date(2024, 12, 21), &place, &params).unwrap();
            assert!(times.dhuhr < times.asr, "{}", lat);
            assert!(times.is_ordered(), "{}", lat);
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = MethodParams { fajr_angle: -3.0, ..Default::default() };
        let err = calculate_prayer_times(date(2024, 3, 15), &doraville(), &params).unwrap_err();
        assert!(matches!(err, MiqatError::Calculation(_)));
    }

    #[test]
    fn test_invalid_location_rejected() {
        let bad = Location::new_unchecked(91.0, 0.0, Tz::UTC);
        let err = calculate_prayer_times(date(2024, 3, 15), &bad, &MethodParams::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
