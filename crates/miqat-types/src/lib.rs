//! Core types for miqat - prayer time resolution engine.
//!
//! This crate contains pure type definitions with no business logic.

mod error;
mod geo;
mod hijri;
mod method;
mod prayer;
mod schedule;
mod time_spec;
mod times;

pub use error::MiqatError;
pub use geo::Location;
pub use hijri::{HijriDay, MONTH_RAMADAN, hijri_month_name};
pub use method::{AsrSchool, CalculationMethod, HighLatitudeRule, MethodParams, MidnightMode, TwilightRule};
pub use prayer::Prayer;
pub use schedule::{PrayerSchedule, PrayerSlot};
pub use time_spec::{TimeSpec, parse_clock, resolve_local};
pub use times::{RawSchedule, RawTimes, SourceLayer};

pub use chrono_tz::Tz;
