//! Unmerged prayer times and their provenance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CalculationMethod, Prayer};

/// Which layer produced a time. A provenance tag, not a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "provider", rename_all = "snake_case")]
pub enum SourceLayer {
    RemoteProvider(String),
    LocalCalculation,
    ManualOverride,
    OfflineSchedule,
}

impl SourceLayer {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteProvider(_))
    }

    /// Name of the remote provider, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RemoteProvider(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteProvider(name) => write!(f, "remote:{}", name),
            Self::LocalCalculation => write!(f, "local"),
            Self::ManualOverride => write!(f, "override"),
            Self::OfflineSchedule => write!(f, "offline"),
        }
    }
}

/// Prayer instants in UTC for one day, as produced by a provider or the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimes {
    pub imsak: DateTime<Utc>,
    pub fajr: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub dhuhr: DateTime<Utc>,
    pub asr: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub maghrib: DateTime<Utc>,
    pub isha: DateTime<Utc>,
    pub midnight: DateTime<Utc>,
}

impl RawTimes {
    pub fn get(&self, prayer: Prayer) -> DateTime<Utc> {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Sunrise => self.sunrise,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    /// Fajr < Sunrise < Dhuhr < Asr < Maghrib < Isha.
    pub fn is_ordered(&self) -> bool {
        Prayer::ALL
            .windows(2)
            .all(|pair| self.get(pair[0]) < self.get(pair[1]))
    }
}

/// Raw times tagged with the request they answer and the layer that served them.
///
/// This is what the schedule cache stores; overrides are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSchedule {
    pub date: NaiveDate,
    pub method: CalculationMethod,
    pub times: RawTimes,
    pub source: SourceLayer,
}
