//! Prayer names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MiqatError;

/// A scheduled daily event. Sunrise is not a prayer but bounds Fajr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// Every schedule entry in chronological order.
    pub const ALL: [Prayer; 6] = [
        Self::Fajr,
        Self::Sunrise,
        Self::Dhuhr,
        Self::Asr,
        Self::Maghrib,
        Self::Isha,
    ];

    /// The five obligatory prayers.
    pub const FIVE: [Prayer; 5] = [Self::Fajr, Self::Dhuhr, Self::Asr, Self::Maghrib, Self::Isha];

    pub fn is_obligatory(&self) -> bool {
        !matches!(self, Self::Sunrise)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fajr => "Fajr",
            Self::Sunrise => "Sunrise",
            Self::Dhuhr => "Dhuhr",
            Self::Asr => "Asr",
            Self::Maghrib => "Maghrib",
            Self::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Prayer {
    type Err = MiqatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fajr" | "subuh" => Ok(Self::Fajr),
            "sunrise" | "shuruq" => Ok(Self::Sunrise),
            "dhuhr" | "zuhr" => Ok(Self::Dhuhr),
            "asr" => Ok(Self::Asr),
            "maghrib" => Ok(Self::Maghrib),
            "isha" => Ok(Self::Isha),
            other => Err(MiqatError::invalid_input(format!("Unknown prayer '{}'", other))),
        }
    }
}
