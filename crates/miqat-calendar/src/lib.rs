//! Hijri calendar conversion for miqat.
//!
//! Two variants are offered:
//!
//! - [`HijriCalendar::Tabular`]: the arithmetical (Kuwaiti, civil epoch)
//!   calendar with a 30-year leap cycle. Defined for every date from
//!   1 Muharram 1 AH onward and exactly invertible.
//! - [`HijriCalendar::UmmAlQura`]: the Umm al-Qura table from the
//!   `hijri_date` crate for Gregorian years 1938-2076, tabular outside it.
//!
//! Both are approximations of the observed calendar. They drive Ramadan
//! detection and display only; they are not a basis for religious rulings.

use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

pub use miqat_types::{HijriDay, MiqatError, hijri_month_name};

/// Minimum Gregorian year covered by the Umm al-Qura table.
pub const UMM_AL_QURA_MIN_YEAR: i32 = 1938;
/// Maximum Gregorian year covered by the Umm al-Qura table.
pub const UMM_AL_QURA_MAX_YEAR: i32 = 2076;

/// Julian Day Number of 1 Muharram 1 AH (16 July 622, Julian calendar).
const CIVIL_EPOCH_JDN: i64 = 1_948_440;
/// JDN minus chrono's day count from 0001-01-01 (which is day 1).
const JDN_CE_OFFSET: i64 = 1_721_425;

/// Which Hijri reckoning to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HijriCalendar {
    #[default]
    Tabular,
    UmmAlQura,
}

impl HijriCalendar {
    /// Converts a Gregorian date, shifting by `adjustment` days first
    /// (positive = Hijri ahead, for local moon sighting).
    pub fn to_hijri(&self, date: NaiveDate, adjustment: i64) -> Result<HijriDay, MiqatError> {
        match self {
            Self::Tabular => to_hijri(date, adjustment),
            Self::UmmAlQura => {
                let adjusted = shift(date, adjustment)?;
                if (UMM_AL_QURA_MIN_YEAR..=UMM_AL_QURA_MAX_YEAR).contains(&adjusted.year()) {
                    umm_al_qura(adjusted)
                } else {
                    to_hijri(adjusted, 0)
                }
            }
        }
    }

    /// Inverse of [`HijriCalendar::to_hijri`] with zero adjustment.
    pub fn to_gregorian(&self, hijri: HijriDay) -> Result<NaiveDate, MiqatError> {
        let estimate = to_gregorian(hijri)?;
        match self {
            Self::Tabular => Ok(estimate),
            Self::UmmAlQura => {
                if !(UMM_AL_QURA_MIN_YEAR..=UMM_AL_QURA_MAX_YEAR).contains(&estimate.year()) {
                    return Ok(estimate);
                }
                // The table never drifts more than a couple of days from the tabular calendar.
                (-3..=3)
                    .filter_map(|offset| estimate.checked_add_signed(Duration::days(offset)))
                    .find(|candidate| umm_al_qura(*candidate).ok() == Some(hijri))
                    .ok_or_else(|| {
                        MiqatError::HijriConversion(format!("{} is not an Umm al-Qura date", hijri))
                    })
            }
        }
    }
}

// Thread-local cache: (gregorian, adjustment) -> hijri
thread_local! {
    static HIJRI_CACHE: RefCell<Option<(NaiveDate, i64, HijriDay)>> = const { RefCell::new(None) };
}

/// Converts Gregorian to tabular Hijri with adjustment.
///
/// # Arguments
/// * `date` - Gregorian date
/// * `adjustment` - Day offset for moon sighting (positive = Hijri ahead)
///
/// # Errors
/// Returns `DateOutOfRange` for dates before 1 Muharram 1 AH.
pub fn to_hijri(date: NaiveDate, adjustment: i64) -> Result<HijriDay, MiqatError> {
    let cached = HIJRI_CACHE.with(|cache| {
        cache.borrow().and_then(|(d, adj, hijri)| {
            (d == date && adj == adjustment).then_some(hijri)
        })
    });
    if let Some(hijri) = cached {
        return Ok(hijri);
    }

    let adjusted = shift(date, adjustment)?;
    let jdn = gregorian_to_jdn(adjusted);
    if jdn < CIVIL_EPOCH_JDN {
        return Err(MiqatError::date_out_of_range(adjusted, epoch_date(), NaiveDate::MAX));
    }

    let days = jdn - CIVIL_EPOCH_JDN;
    let mut year = ((30 * days + 10_646) / 10_631) as i32;
    while hijri_to_jdn(year + 1, 1, 1) <= jdn {
        year += 1;
    }
    while hijri_to_jdn(year, 1, 1) > jdn {
        year -= 1;
    }

    let mut remaining = jdn - hijri_to_jdn(year, 1, 1);
    let mut month = 1;
    while month < 12 && remaining >= i64::from(month_length(year, month)) {
        remaining -= i64::from(month_length(year, month));
        month += 1;
    }
    let hijri = HijriDay::new(year, month, remaining as u32 + 1);

    HIJRI_CACHE.with(|cache| {
        *cache.borrow_mut() = Some((date, adjustment, hijri));
    });

    Ok(hijri)
}

/// Converts a tabular Hijri date back to Gregorian.
///
/// # Errors
/// Returns `HijriConversion` for a month or day that does not exist.
pub fn to_gregorian(hijri: HijriDay) -> Result<NaiveDate, MiqatError> {
    if hijri.year < 1 {
        return Err(MiqatError::HijriConversion(format!("year {} precedes the Hijra", hijri.year)));
    }
    if !(1..=12).contains(&hijri.month) {
        return Err(MiqatError::HijriConversion(format!("month {} out of range 1-12", hijri.month)));
    }
    let length = month_length(hijri.year, hijri.month);
    if hijri.day < 1 || hijri.day > length {
        return Err(MiqatError::HijriConversion(format!(
            "day {} out of range 1-{} for {} {}",
            hijri.day,
            length,
            hijri_month_name(hijri.month),
            hijri.year
        )));
    }

    jdn_to_gregorian(hijri_to_jdn(hijri.year, hijri.month, hijri.day))
        .ok_or_else(|| MiqatError::HijriConversion(format!("{} beyond Gregorian range", hijri)))
}

/// Umm al-Qura conversion (Gregorian years 1938-2076 only).
pub fn umm_al_qura(date: NaiveDate) -> Result<HijriDay, MiqatError> {
    let year = date.year();
    if !(UMM_AL_QURA_MIN_YEAR..=UMM_AL_QURA_MAX_YEAR).contains(&year) {
        return Err(MiqatError::date_out_of_range(
            date,
            NaiveDate::from_ymd_opt(UMM_AL_QURA_MIN_YEAR, 1, 1).unwrap_or(NaiveDate::MIN),
            NaiveDate::from_ymd_opt(UMM_AL_QURA_MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX),
        ));
    }

    let hijri = HijriDate::from_gr(year as usize, date.month() as usize, date.day() as usize)
        .map_err(|e| MiqatError::HijriConversion(e.to_string()))?;

    Ok(HijriDay::new(hijri.year() as i32, hijri.month() as u32, hijri.day() as u32))
}

/// Leap years (355 days) fall on years 2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29 of each cycle.
pub fn is_leap_year(year: i32) -> bool {
    (14 + 11 * i64::from(year)).rem_euclid(30) < 11
}

/// Odd months have 30 days, even months 29, Dhu al-Hijjah 30 in leap years.
pub fn month_length(year: i32, month: u32) -> u32 {
    if month % 2 == 1 || (month == 12 && is_leap_year(year)) {
        30
    } else {
        29
    }
}

fn hijri_to_jdn(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year);
    let m = i64::from(month);
    i64::from(day) + (59 * (m - 1) + 1) / 2 + (y - 1) * 354 + (3 + 11 * y).div_euclid(30)
        + CIVIL_EPOCH_JDN
        - 1
}

fn gregorian_to_jdn(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + JDN_CE_OFFSET
}

fn jdn_to_gregorian(jdn: i64) -> Option<NaiveDate> {
    i32::try_from(jdn - JDN_CE_OFFSET)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

fn epoch_date() -> NaiveDate {
    jdn_to_gregorian(CIVIL_EPOCH_JDN).unwrap_or(NaiveDate::MIN)
}

fn shift(date: NaiveDate, adjustment: i64) -> Result<NaiveDate, MiqatError> {
    date.checked_add_signed(Duration::days(adjustment))
        .ok_or_else(|| MiqatError::date_out_of_range(date, NaiveDate::MIN, NaiveDate::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cache_hit() {
        let date = ymd(2024, 3, 11);
        let h1 = to_hijri(date, 0).unwrap();
        let h2 = to_hijri(date, 0).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_epoch() {
        assert_eq!(to_hijri(ymd(622, 7, 19), 0).unwrap(), HijriDay::new(1, 1, 1));
        assert!(matches!(
            to_hijri(ymd(622, 7, 18), 0),
            Err(MiqatError::DateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_ramadan_1446() {
        assert_eq!(to_hijri(ymd(2025, 3, 1), 0).unwrap(), HijriDay::new(1446, 9, 1));
        assert_eq!(to_hijri(ymd(2025, 3, 30), 0).unwrap(), HijriDay::new(1446, 9, 30));
        assert_eq!(to_hijri(ymd(2025, 3, 31), 0).unwrap(), HijriDay::new(1446, 10, 1));
        assert!(to_hijri(ymd(2025, 3, 15), 0).unwrap().is_ramadan());
    }

    #[test]
    fn test_adjustment_shifts_date() {
        let unadjusted = to_hijri(ymd(2025, 3, 1), 0).unwrap();
        let behind = to_hijri(ymd(2025, 3, 1), -1).unwrap();
        assert_eq!(unadjusted.month, 9);
        assert_eq!(behind.month, 8);
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(month_length(1446, 9), 30);
        assert_eq!(month_length(1446, 10), 29);
        assert!(is_leap_year(2));
        assert!(!is_leap_year(3));
        assert_eq!(month_length(2, 12), 30);
    }

    #[test]
    fn test_round_trip_across_centuries() {
        let mut date = ymd(700, 1, 1);
        let end = ymd(2900, 1, 1);
        let mut checked = 0;
        while date < end {
            let hijri = to_hijri(date, 0).unwrap();
            assert_eq!(to_gregorian(hijri).unwrap(), date, "{} -> {}", date, hijri);
            date += Duration::days(3_407);
            checked += 1;
        }
        assert!(checked >= 200);
    }

    #[test]
    fn test_invalid_hijri_rejected() {
        assert!(to_gregorian(HijriDay::new(1446, 13, 1)).is_err());
        assert!(to_gregorian(HijriDay::new(1446, 10, 30)).is_err());
        assert!(to_gregorian(HijriDay::new(0, 1, 1)).is_err());
    }

    #[test]
    fn test_umm_al_qura_ramadan() {
        let h = HijriCalendar::UmmAlQura.to_hijri(ymd(2025, 3, 15), 0).unwrap();
        assert_eq!((h.year, h.month), (1446, 9));
        let back = HijriCalendar::UmmAlQura.to_gregorian(h).unwrap();
        assert_eq!(back, ymd(2025, 3, 15));
    }

    #[test]
    fn test_umm_al_qura_outside_table_falls_back() {
        let date = ymd(1900, 1, 1);
        assert!(umm_al_qura(date).is_err());
        assert_eq!(
            HijriCalendar::UmmAlQura.to_hijri(date, 0).unwrap(),
            HijriCalendar::Tabular.to_hijri(date, 0).unwrap()
        );
    }

    proptest! {
        #[test]
        fn round_trip_any_date(days in 0i64..900_000) {
            let date = ymd(623, 1, 1) + Duration::days(days);
            let hijri = to_hijri(date, 0).unwrap();
            prop_assert!(hijri.day >= 1 && hijri.day <= month_length(hijri.year, hijri.month));
            prop_assert_eq!(to_gregorian(hijri).unwrap(), date);
        }
    }
}
