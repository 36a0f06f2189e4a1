//! Calculation methods and their twilight parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MiqatError;

/// Named set of twilight angles published by an Islamic authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Muslim World League.
    MuslimWorldLeague,
    /// Islamic Society of North America.
    Isna,
    /// Egyptian General Authority of Survey.
    Egyptian,
    /// Umm al-Qura University, Makkah.
    UmmAlQura,
    /// University of Islamic Sciences, Karachi.
    Karachi,
    /// Institute of Geophysics, University of Tehran.
    Tehran,
    /// Shia Ithna Ashari, Leva Institute, Qum.
    Jafari,
    /// MABIMS (Indonesia, Malaysia, Brunei, Singapore).
    Mabims,
    /// Parameters supplied by configuration.
    Custom,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 9] = [
        Self::MuslimWorldLeague,
        Self::Isna,
        Self::Egyptian,
        Self::UmmAlQura,
        Self::Karachi,
        Self::Tehran,
        Self::Jafari,
        Self::Mabims,
        Self::Custom,
    ];

    /// Canonical parameters. `None` for `Custom`, which has no canonical table.
    pub fn params(&self) -> Option<MethodParams> {
        let base = MethodParams::default();
        let params = match self {
            Self::MuslimWorldLeague => MethodParams { fajr_angle: 18.0, isha: TwilightRule::Angle(17.0), ..base },
            Self::Isna => MethodParams { fajr_angle: 15.0, isha: TwilightRule::Angle(15.0), ..base },
            Self::Egyptian => MethodParams { fajr_angle: 19.5, isha: TwilightRule::Angle(17.5), ..base },
            Self::UmmAlQura => MethodParams { fajr_angle: 18.5, isha: TwilightRule::MinutesAfter(90.0), ..base },
            Self::Karachi => MethodParams { fajr_angle: 18.0, isha: TwilightRule::Angle(18.0), ..base },
            Self::Tehran => MethodParams {
                fajr_angle: 17.7,
                isha: TwilightRule::Angle(14.0),
                maghrib: TwilightRule::Angle(4.5),
                midnight: MidnightMode::Jafari,
                ..base
            },
            Self::Jafari => MethodParams {
                fajr_angle: 16.0,
                isha: TwilightRule::Angle(14.0),
                maghrib: TwilightRule::Angle(4.0),
                midnight: MidnightMode::Jafari,
                ..base
            },
            Self::Mabims => MethodParams { fajr_angle: 20.0, isha: TwilightRule::Angle(18.0), ..base },
            Self::Custom => return None,
        };
        Some(params)
    }

    /// Stable identifier used in configuration and cache keys.
    pub fn id(&self) -> &'static str {
        match self {
            Self::MuslimWorldLeague => "mwl",
            Self::Isna => "isna",
            Self::Egyptian => "egyptian",
            Self::UmmAlQura => "umm_al_qura",
            Self::Karachi => "karachi",
            Self::Tehran => "tehran",
            Self::Jafari => "jafari",
            Self::Mabims => "mabims",
            Self::Custom => "custom",
        }
    }
}

impl Default for CalculationMethod {
    fn default() -> Self {
        Self::MuslimWorldLeague
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MuslimWorldLeague => "Muslim World League",
            Self::Isna => "Islamic Society of North America",
            Self::Egyptian => "Egyptian General Authority of Survey",
            Self::UmmAlQura => "Umm al-Qura, Makkah",
            Self::Karachi => "University of Islamic Sciences, Karachi",
            Self::Tehran => "Institute of Geophysics, Tehran",
            Self::Jafari => "Shia Ithna Ashari (Jafari)",
            Self::Mabims => "MABIMS",
            Self::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CalculationMethod {
    type Err = MiqatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "mwl" | "muslimworldleague" => Ok(Self::MuslimWorldLeague),
            "isna" => Ok(Self::Isna),
            "egyptian" | "egypt" => Ok(Self::Egyptian),
            "ummalqura" | "makkah" => Ok(Self::UmmAlQura),
            "karachi" => Ok(Self::Karachi),
            "tehran" => Ok(Self::Tehran),
            "jafari" => Ok(Self::Jafari),
            "mabims" | "singapore" | "kemenag" => Ok(Self::Mabims),
            "custom" => Ok(Self::Custom),
            _ => Err(MiqatError::invalid_input(format!("Unknown calculation method '{}'", s))),
        }
    }
}

/// How a twilight time is derived: a sun depression angle or a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwilightRule {
    /// Sun depression below the horizon, in degrees.
    Angle(f64),
    /// Fixed minutes after the preceding event (sunset for Maghrib, Maghrib for Isha).
    MinutesAfter(f64),
}

/// Shadow-length factor for Asr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsrSchool {
    /// Shafi'i, Maliki, Hanbali: shadow equals object length.
    Standard,
    /// Hanafi: shadow equals twice the object length.
    Hanafi,
}

impl AsrSchool {
    pub fn shadow_factor(&self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Hanafi => 2.0,
        }
    }
}

impl Default for AsrSchool {
    fn default() -> Self {
        Self::Standard
    }
}

/// Adjustment for latitudes where twilight angles may never be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighLatitudeRule {
    /// Only fill in times that are undefined (using the middle of the night).
    None,
    /// Fajr/Isha no further than half the night from sunrise/sunset.
    MiddleOfNight,
    /// Fajr/Isha no further than one seventh of the night.
    OneSeventh,
    /// Portion of the night equal to angle / 60.
    AngleBased,
    /// Recompute undefined times at 48.5° latitude.
    NearestLatitude,
}

impl Default for HighLatitudeRule {
    fn default() -> Self {
        Self::AngleBased
    }
}

/// Definition of midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidnightMode {
    /// Midpoint of sunset and sunrise.
    Standard,
    /// Midpoint of sunset and Fajr.
    Jafari,
}

impl Default for MidnightMode {
    fn default() -> Self {
        Self::Standard
    }
}

/// Parameters driving the astronomical calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodParams {
    /// Sun depression at Fajr, in degrees (positive).
    pub fajr_angle: f64,
    pub isha: TwilightRule,
    pub maghrib: TwilightRule,
    /// Minutes added to solar noon for Dhuhr.
    pub dhuhr_offset_minutes: f64,
    /// Minutes before Fajr for Imsak.
    pub imsak_minutes: f64,
    pub asr_school: AsrSchool,
    pub high_latitude_rule: HighLatitudeRule,
    pub midnight: MidnightMode,
}

impl Default for MethodParams {
    fn default() -> Self {
        Self {
            fajr_angle: 18.0,
            isha: TwilightRule::Angle(17.0),
            maghrib: TwilightRule::MinutesAfter(0.0),
            dhuhr_offset_minutes: 1.0,
            imsak_minutes: 10.0,
            asr_school: AsrSchool::Standard,
            high_latitude_rule: HighLatitudeRule::AngleBased,
            midnight: MidnightMode::Standard,
        }
    }
}

impl MethodParams {
    pub fn with_asr_school(mut self, school: AsrSchool) -> Self {
        self.asr_school = school;
        self
    }

    pub fn with_high_latitude_rule(mut self, rule: HighLatitudeRule) -> Self {
        self.high_latitude_rule = rule;
        self
    }

    /// Rejects non-finite or implausible values.
    pub fn validate(&self) -> Result<(), MiqatError> {
        fn check_angle(name: &str, angle: f64) -> Result<(), MiqatError> {
            if !angle.is_finite() || angle <= 0.0 || angle > 30.0 {
                return Err(MiqatError::Calculation(format!(
                    "{} angle {} outside (0, 30] degrees",
                    name, angle
                )));
            }
            Ok(())
        }
        fn check_minutes(name: &str, minutes: f64, max: f64) -> Result<(), MiqatError> {
            if !minutes.is_finite() || minutes < 0.0 || minutes > max {
                return Err(MiqatError::Calculation(format!(
                    "{} interval {} outside [0, {}] minutes",
                    name, minutes, max
                )));
            }
            Ok(())
        }
        fn check_rule(name: &str, rule: TwilightRule) -> Result<(), MiqatError> {
            match rule {
                TwilightRule::Angle(a) => check_angle(name, a),
                TwilightRule::MinutesAfter(m) => check_minutes(name, m, 240.0),
            }
        }

        check_angle("Fajr", self.fajr_angle)?;
        check_rule("Isha", self.isha)?;
        check_rule("Maghrib", self.maghrib)?;
        check_minutes("Dhuhr offset", self.dhuhr_offset_minutes, 30.0)?;
        check_minutes("Imsak", self.imsak_minutes, 60.0)?;
        if let (TwilightRule::Angle(maghrib), TwilightRule::Angle(isha)) = (self.maghrib, self.isha) {
            if maghrib >= isha {
                return Err(MiqatError::Calculation(format!(
                    "Maghrib angle {} must be below Isha angle {}",
                    maghrib, isha
                )));
            }
        }
        Ok(())
    }
}
