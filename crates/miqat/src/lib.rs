//! # Miqat
//!
//! Prayer time resolution: the five daily prayers and sunrise for any
//! location and date, with Iqamah times, Qibla bearing, Hijri date and
//! Ramadan Tarawih.
//!
//! Times come from the first layer that answers: the schedule cache,
//! configured remote providers, the local astronomical calculator, and
//! finally a bundled offline table. Administrator overrides are applied on
//! top of whichever layer served the day.
//!
//! This crate is a facade that re-exports the `miqat` workspace.
//!
//! ## Modules
//!
//! - `miqat-types`: core types (`Location`, `CalculationMethod`, `PrayerSchedule`, ...)
//! - `miqat-calendar`: Hijri conversion (tabular and Umm al-Qura)
//! - `miqat-astronomy`: solar position, prayer times, Qibla
//! - `miqat-network`: remote provider adapters
//! - `miqat-rules`: override store and schedule merging
//!
//! ## Usage
//!
//! ```rust,no_run
//! use miqat::prelude::*;
//! use chrono::NaiveDate;
//!
//! # async fn run() -> Result<(), MiqatError> {
//! let engine = PrayerEngine::new(EngineConfig::from_env());
//! let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
//! let schedule = engine.resolve_default(date).await?; // Result<PrayerSchedule, MiqatError>
//! # Ok(())
//! # }
//! ```

pub use miqat_core::*;
