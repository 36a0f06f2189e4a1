//! Prayer time resolution engine.
//!
//! Produces, for any location, date and calculation method, a fully
//! resolved daily schedule: the five prayers and sunrise, Iqamah times,
//! Qibla bearing, Hijri date and, during Ramadan, Tarawih. A schedule is
//! returned for every valid input; the `source_layer` tells which layer
//! served it.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use miqat_core::prelude::*;
//!
//! # async fn run() -> Result<(), MiqatError> {
//! let engine = PrayerEngine::new(EngineConfig::default());
//! let doraville = Location::new(33.9114, -84.2614, Tz::America__New_York)?;
//! let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//!
//! let schedule = engine.resolve_schedule(&doraville, date, CalculationMethod::Isna).await?;
//! println!("Maghrib: {}", schedule.time(Prayer::Maghrib));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod offline;
pub mod orchestrator;

pub use cache::{CacheKey, CacheStats, ScheduleCache};
pub use config::{EngineConfig, MAX_HIJRI_ADJUSTMENT, ProviderConfig, ProviderKind};
pub use engine::{MAX_YEAR, MIN_YEAR, PrayerEngine};
pub use offline::offline_schedule;
pub use orchestrator::FallbackOrchestrator;

pub use miqat_astronomy::{calculate_prayer_times, distance_to_kaaba_km, qibla_bearing};
pub use miqat_calendar::{HijriCalendar, to_gregorian, to_hijri};
pub use miqat_network::{AladhanProvider, ProviderError, ProviderRequest, TimeProvider, TimetableFeedProvider};
pub use miqat_rules::{
    InMemoryOverrideStore, IqamahTimes, OverrideId, OverrideStore, OverrideUpdate, PrayerOverride, TarawihConfig,
    merge,
};
pub use miqat_types::*;

pub use tokio_util::sync::CancellationToken;

/// Common imports.
pub mod prelude {
    pub use crate::{
        CalculationMethod, CancellationToken, EngineConfig, HijriDay, Location, MiqatError, OverrideStore, Prayer,
        PrayerEngine, PrayerSchedule, SourceLayer, TimeSpec, Tz,
    };
}
