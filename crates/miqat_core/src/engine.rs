//! The public entry point.

use chrono::{Datelike, Days, NaiveDate};
use miqat_astronomy::qibla_bearing;
use miqat_network::TimeProvider;
use miqat_rules::{InMemoryOverrideStore, OverrideStore, merge};
use miqat_types::{CalculationMethod, Location, MiqatError, PrayerSchedule};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::ScheduleCache;
use crate::config::EngineConfig;
use crate::orchestrator::FallbackOrchestrator;

/// Earliest Gregorian year accepted.
pub const MIN_YEAR: i32 = 1000;
/// Latest Gregorian year accepted.
pub const MAX_YEAR: i32 = 3000;

/// Resolves daily prayer schedules.
///
/// Cheap to clone; clones share the cache and the override store.
#[derive(Clone)]
pub struct PrayerEngine {
    config: Arc<EngineConfig>,
    orchestrator: FallbackOrchestrator,
    store: Arc<dyn OverrideStore>,
}

impl std::fmt::Debug for PrayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrayerEngine")
            .field("config", &self.config)
            .field("providers", &self.orchestrator.providers().len())
            .finish_non_exhaustive()
    }
}

impl PrayerEngine {
    /// Engine with the configured providers and an in-memory override store.
    pub fn new(config: EngineConfig) -> Self {
        let providers = config.build_providers();
        Self::with_parts(config, providers, Arc::new(InMemoryOverrideStore::new()))
    }

    pub fn with_parts(
        config: EngineConfig,
        providers: Vec<Arc<dyn TimeProvider>>,
        store: Arc<dyn OverrideStore>,
    ) -> Self {
        let config = Arc::new(config);
        let cache = ScheduleCache::new(config.cache_grid_degrees);
        Self {
            orchestrator: FallbackOrchestrator::new(providers, cache, Arc::clone(&config)),
            config,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ScheduleCache {
        self.orchestrator.cache()
    }

    /// Admin surface for overrides, Iqamah and Tarawih.
    pub fn overrides(&self) -> &dyn OverrideStore {
        self.store.as_ref()
    }

    /// Resolves one date.
    ///
    /// # Errors
    /// `InvalidInput` for bad coordinates or a date outside years 1000-3000.
    /// Provider and calculation failures are absorbed by the fallback layers.
    pub async fn resolve_schedule(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, MiqatError> {
        self.resolve_schedule_with_cancel(location, date, method, &CancellationToken::new()).await
    }

    /// Like [`resolve_schedule`](Self::resolve_schedule), abandoning
    /// remaining provider attempts once `cancel` fires.
    pub async fn resolve_schedule_with_cancel(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
        cancel: &CancellationToken,
    ) -> Result<PrayerSchedule, MiqatError> {
        location.validate()?;
        check_date(date)?;

        let raw = self.orchestrator.resolve(location, date, method, cancel).await;
        let hijri = self.config.hijri_calendar.to_hijri(date, self.config.hijri_adjustment)?;
        let overrides = self.store.overrides_for(date);

        let schedule = merge(
            &raw,
            location,
            &overrides,
            &self.store.iqamah(),
            &self.store.tarawih(),
            hijri,
            qibla_bearing(location),
        );
        info!(%date, method = %method.id(), layer = %raw.source, overrides = overrides.len(), "Resolved schedule");
        Ok(schedule)
    }

    /// Seven consecutive days starting at `start`.
    pub async fn resolve_week(
        &self,
        location: &Location,
        start: NaiveDate,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, MiqatError> {
        self.resolve_days(location, start, 7, method).await
    }

    /// Every day of the given month.
    pub async fn resolve_month(
        &self,
        location: &Location,
        year: i32,
        month: u32,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, MiqatError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| MiqatError::invalid_input(format!("No such month {}-{:02}", year, month)))?;
        let next = first
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(|| MiqatError::invalid_input(format!("No such month {}-{:02}", year, month)))?;
        let days = next.signed_duration_since(first).num_days() as u64;
        self.resolve_days(location, first, days, method).await
    }

    /// Resolves `date` for the configured default location and method.
    pub async fn resolve_default(&self, date: NaiveDate) -> Result<PrayerSchedule, MiqatError> {
        let location = self.config.default_location;
        self.resolve_schedule(&location, date, self.config.default_method).await
    }

    async fn resolve_days(
        &self,
        location: &Location,
        start: NaiveDate,
        days: u64,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, MiqatError> {
        let mut schedules = Vec::with_capacity(days as usize);
        for offset in 0..days {
            let date = start
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| MiqatError::invalid_input(format!("Date overflow after {}", start)))?;
            schedules.push(self.resolve_schedule(location, date, method).await?);
        }
        Ok(schedules)
    }
}

fn check_date(date: NaiveDate) -> Result<(), MiqatError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(MiqatError::invalid_input(format!(
            "Date {} outside supported years {}-{}",
            date, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(())
}
