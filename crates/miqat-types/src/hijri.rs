//! Hijri calendar date value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hijri month number of Ramadan.
pub const MONTH_RAMADAN: u32 = 9;

/// A date in the Hijri calendar.
///
/// Computed arithmetically; it approximates the observed calendar and is
/// meant for display and Ramadan detection, not religious rulings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HijriDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl HijriDay {
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    pub fn is_ramadan(&self) -> bool {
        self.month == MONTH_RAMADAN
    }

    pub fn month_name(&self) -> &'static str {
        hijri_month_name(self.month)
    }
}

impl fmt::Display for HijriDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} AH", self.day, self.month_name(), self.year)
    }
}

/// Returns Hijri month name.
pub fn hijri_month_name(month: u32) -> &'static str {
    match month {
        1 => "Muharram", 2 => "Safar", 3 => "Rabi' al-Awwal", 4 => "Rabi' al-Thani",
        5 => "Jumada al-Ula", 6 => "Jumada al-Akhirah", 7 => "Rajab", 8 => "Sha'ban",
        9 => "Ramadan", 10 => "Shawwal", 11 => "Dhu al-Qi'dah", 12 => "Dhu al-Hijjah",
        _ => "Unknown",
    }
}
