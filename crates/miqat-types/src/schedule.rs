//! The fully resolved daily schedule.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{CalculationMethod, HijriDay, Location, Prayer, SourceLayer};

/// One schedule entry after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerSlot {
    pub prayer: Prayer,
    /// Adhan time in the location's local time.
    pub adhan: DateTime<FixedOffset>,
    /// `ManualOverride` when an active override replaced the computed time.
    pub source: SourceLayer,
    /// Congregation time. Always `None` for sunrise.
    pub iqamah: Option<DateTime<FixedOffset>>,
}

/// A resolved schedule for one date and location.
///
/// Read-only once built: any change in inputs produces a new schedule
/// through the merger rather than an edit of this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerSchedule {
    date: NaiveDate,
    location: Location,
    method: CalculationMethod,
    slots: [PrayerSlot; 6],
    tarawih: Option<DateTime<FixedOffset>>,
    qibla_bearing_degrees: f64,
    hijri: HijriDay,
    source_layer: SourceLayer,
}

impl PrayerSchedule {
    /// Assembles a schedule. `slots` must follow [`Prayer::ALL`] order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        location: Location,
        method: CalculationMethod,
        slots: [PrayerSlot; 6],
        tarawih: Option<DateTime<FixedOffset>>,
        qibla_bearing_degrees: f64,
        hijri: HijriDay,
        source_layer: SourceLayer,
    ) -> Self {
        debug_assert!(slots.iter().zip(Prayer::ALL).all(|(s, p)| s.prayer == p));
        Self {
            date,
            location,
            method,
            slots,
            tarawih,
            qibla_bearing_degrees,
            hijri,
            source_layer,
        }
    }

    pub fn date(&self) -> NaiveDate { self.date }
    pub fn location(&self) -> &Location { &self.location }
    pub fn method(&self) -> CalculationMethod { self.method }
    pub fn hijri(&self) -> HijriDay { self.hijri }
    pub fn qibla_bearing_degrees(&self) -> f64 { self.qibla_bearing_degrees }
    pub fn tarawih(&self) -> Option<DateTime<FixedOffset>> { self.tarawih }

    /// The layer that produced the underlying computed times.
    pub fn source_layer(&self) -> &SourceLayer { &self.source_layer }

    pub fn slots(&self) -> impl Iterator<Item = &PrayerSlot> {
        self.slots.iter()
    }

    pub fn slot(&self, prayer: Prayer) -> &PrayerSlot {
        &self.slots[prayer as usize]
    }

    /// Adhan time of a prayer in local time.
    pub fn time(&self, prayer: Prayer) -> DateTime<FixedOffset> {
        self.slot(prayer).adhan
    }

    pub fn iqamah(&self, prayer: Prayer) -> Option<DateTime<FixedOffset>> {
        self.slot(prayer).iqamah
    }

    /// Prayers whose time came from an administrator override.
    pub fn overridden(&self) -> SmallVec<[Prayer; 5]> {
        self.slots
            .iter()
            .filter(|s| s.source == SourceLayer::ManualOverride)
            .map(|s| s.prayer)
            .collect()
    }

    /// Fajr < Sunrise < Dhuhr < Asr < Maghrib < Isha.
    pub fn is_ordered(&self) -> bool {
        self.slots.windows(2).all(|pair| pair[0].adhan < pair[1].adhan)
    }
}
