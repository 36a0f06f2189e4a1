//! Administrator-entered data: per-date overrides, Iqamah times, Tarawih.
//!
//! Values are validated and parsed here, at write time. Anything that
//! makes it into the store is well formed, so the merger never has to
//! re-parse or reject.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use miqat_types::{HijriDay, MiqatError, Prayer, TimeSpec, parse_clock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Longest accepted Iqamah delay after the Adhan, in minutes.
pub const MAX_IQAMAH_OFFSET: i64 = 120;
/// Longest accepted Tarawih delay after Isha, in minutes.
pub const MAX_TARAWIH_OFFSET: i64 = 180;

pub type OverrideId = u64;

/// A manual Adhan time for one prayer on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerOverride {
    pub id: OverrideId,
    pub date: NaiveDate,
    pub prayer: Prayer,
    /// Local wall-clock time at the mosque.
    pub time: NaiveTime,
    pub reason: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial edit of an override. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideUpdate {
    pub time: Option<String>,
    pub reason: Option<String>,
    pub is_active: Option<bool>,
}

/// Mosque-wide congregation times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IqamahTimes {
    pub fajr: TimeSpec,
    pub dhuhr: TimeSpec,
    pub asr: TimeSpec,
    pub maghrib: TimeSpec,
    pub isha: TimeSpec,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for IqamahTimes {
    fn default() -> Self {
        Self {
            fajr: TimeSpec::after(Prayer::Fajr, 20),
            dhuhr: TimeSpec::after(Prayer::Dhuhr, 10),
            asr: TimeSpec::after(Prayer::Asr, 10),
            maghrib: TimeSpec::after(Prayer::Maghrib, 5),
            isha: TimeSpec::after(Prayer::Isha, 10),
            updated_at: None,
        }
    }
}

impl IqamahTimes {
    /// `None` for sunrise, which has no congregation.
    pub fn get(&self, prayer: Prayer) -> Option<TimeSpec> {
        match prayer {
            Prayer::Fajr => Some(self.fajr),
            Prayer::Sunrise => None,
            Prayer::Dhuhr => Some(self.dhuhr),
            Prayer::Asr => Some(self.asr),
            Prayer::Maghrib => Some(self.maghrib),
            Prayer::Isha => Some(self.isha),
        }
    }

    fn slot_mut(&mut self, prayer: Prayer) -> Option<&mut TimeSpec> {
        match prayer {
            Prayer::Fajr => Some(&mut self.fajr),
            Prayer::Sunrise => None,
            Prayer::Dhuhr => Some(&mut self.dhuhr),
            Prayer::Asr => Some(&mut self.asr),
            Prayer::Maghrib => Some(&mut self.maghrib),
            Prayer::Isha => Some(&mut self.isha),
        }
    }
}

/// Tarawih display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarawihConfig {
    /// Show outside Ramadan too.
    pub enabled: bool,
    pub time: TimeSpec,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for TarawihConfig {
    fn default() -> Self {
        Self { enabled: false, time: TimeSpec::after(Prayer::Isha, 20), updated_at: None }
    }
}

impl TarawihConfig {
    pub fn is_visible(&self, hijri: HijriDay) -> bool {
        self.enabled || hijri.is_ramadan()
    }
}

/// Storage for administrator data.
///
/// Writes are serialized per store; the last committed write wins.
pub trait OverrideStore: Send + Sync {
    /// Adds an active override, superseding any active one for the same date and prayer.
    fn create_override(
        &self,
        date: NaiveDate,
        prayer: Prayer,
        time: &str,
        reason: &str,
    ) -> Result<PrayerOverride, MiqatError>;

    fn update_override(&self, id: OverrideId, update: OverrideUpdate) -> Result<PrayerOverride, MiqatError>;

    /// Soft delete: the record stays for audit but no longer applies.
    fn deactivate_override(&self, id: OverrideId) -> Result<PrayerOverride, MiqatError>;

    /// Hard delete. Returns the removed record.
    fn delete_override(&self, id: OverrideId) -> Result<PrayerOverride, MiqatError>;

    fn get_override(&self, id: OverrideId) -> Option<PrayerOverride>;

    /// Active overrides for a date, at most one per prayer.
    fn overrides_for(&self, date: NaiveDate) -> Vec<PrayerOverride>;

    /// Every record, active or not, ordered by date then prayer.
    fn list_overrides(&self) -> Vec<PrayerOverride>;

    fn iqamah(&self) -> IqamahTimes;

    /// Sets one prayer's Iqamah from `"HH:MM"` or `"+N"`.
    fn set_iqamah(&self, prayer: Prayer, value: &str) -> Result<IqamahTimes, MiqatError>;

    fn tarawih(&self) -> TarawihConfig;

    /// Sets Tarawih from `"HH:MM"`, `"+N"` or `"+N after Isha"`.
    fn set_tarawih(&self, enabled: bool, time: &str) -> Result<TarawihConfig, MiqatError>;
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: OverrideId,
    overrides: BTreeMap<OverrideId, PrayerOverride>,
    iqamah: IqamahTimes,
    tarawih: TarawihConfig,
}

impl StoreState {
    /// Deactivates active records for the key, except `keep`.
    fn supersede(&mut self, date: NaiveDate, prayer: Prayer, keep: OverrideId, now: DateTime<Utc>) {
        for record in self.overrides.values_mut() {
            if record.id != keep && record.is_active && record.date == date && record.prayer == prayer {
                record.is_active = false;
                record.updated_at = now;
                info!(id = record.id, %date, %prayer, superseded_by = keep, "Override superseded");
            }
        }
    }
}

/// Process-local [`OverrideStore`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOverrideStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: OverrideId) -> MiqatError {
    MiqatError::invalid_override(format!("No override with id {}", id))
}

fn check_prayer(prayer: Prayer) -> Result<(), MiqatError> {
    if !prayer.is_obligatory() {
        return Err(MiqatError::invalid_override(format!("{} cannot be overridden", prayer)));
    }
    Ok(())
}

fn check_offset(spec: TimeSpec, expected: Prayer, max: i64, what: &str) -> Result<(), MiqatError> {
    if let TimeSpec::OffsetMinutes { minutes, reference } = spec {
        if reference != expected {
            return Err(MiqatError::invalid_override(format!(
                "{} offset must be relative to {}, not {}",
                what, expected, reference
            )));
        }
        if !(0..=max).contains(&minutes) {
            return Err(MiqatError::invalid_override(format!(
                "{} offset {} outside 0..={} minutes",
                what, minutes, max
            )));
        }
    }
    Ok(())
}

impl OverrideStore for InMemoryOverrideStore {
    fn create_override(
        &self,
        date: NaiveDate,
        prayer: Prayer,
        time: &str,
        reason: &str,
    ) -> Result<PrayerOverride, MiqatError> {
        check_prayer(prayer)?;
        let time = parse_clock(time)?;
        let now = Utc::now();

        let mut state = self.write();
        state.next_id += 1;
        let record = PrayerOverride {
            id: state.next_id,
            date,
            prayer,
            time,
            reason: reason.trim().to_string(),
            is_active: true,
            updated_at: now,
        };
        state.supersede(date, prayer, record.id, now);
        state.overrides.insert(record.id, record.clone());
        info!(id = record.id, %date, %prayer, time = %record.time, "Override created");
        Ok(record)
    }

    fn update_override(&self, id: OverrideId, update: OverrideUpdate) -> Result<PrayerOverride, MiqatError> {
        let time = update.time.as_deref().map(parse_clock).transpose()?;
        let now = Utc::now();

        let mut state = self.write();
        let record = state.overrides.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(time) = time {
            record.time = time;
        }
        if let Some(reason) = update.reason {
            record.reason = reason.trim().to_string();
        }
        let reactivated = update.is_active == Some(true) && !record.is_active;
        if let Some(active) = update.is_active {
            record.is_active = active;
        }
        record.updated_at = now;
        let record = record.clone();

        if reactivated {
            state.supersede(record.date, record.prayer, id, now);
        }
        Ok(record)
    }

    fn deactivate_override(&self, id: OverrideId) -> Result<PrayerOverride, MiqatError> {
        self.update_override(id, OverrideUpdate { is_active: Some(false), ..Default::default() })
    }

    fn delete_override(&self, id: OverrideId) -> Result<PrayerOverride, MiqatError> {
        let removed = self.write().overrides.remove(&id).ok_or_else(|| not_found(id))?;
        info!(id, date = %removed.date, prayer = %removed.prayer, "Override deleted");
        Ok(removed)
    }

    fn get_override(&self, id: OverrideId) -> Option<PrayerOverride> {
        self.read().overrides.get(&id).cloned()
    }

    fn overrides_for(&self, date: NaiveDate) -> Vec<PrayerOverride> {
        self.read()
            .overrides
            .values()
            .filter(|o| o.is_active && o.date == date)
            .cloned()
            .collect()
    }

    fn list_overrides(&self) -> Vec<PrayerOverride> {
        let mut all: Vec<PrayerOverride> = self.read().overrides.values().cloned().collect();
        all.sort_by_key(|o| (o.date, o.prayer, o.id));
        all
    }

    fn iqamah(&self) -> IqamahTimes {
        self.read().iqamah.clone()
    }

    fn set_iqamah(&self, prayer: Prayer, value: &str) -> Result<IqamahTimes, MiqatError> {
        check_prayer(prayer)?;
        let spec = TimeSpec::parse(value, prayer)?;
        check_offset(spec, prayer, MAX_IQAMAH_OFFSET, "Iqamah")?;

        let mut state = self.write();
        if let Some(slot) = state.iqamah.slot_mut(prayer) {
            *slot = spec;
        }
        state.iqamah.updated_at = Some(Utc::now());
        Ok(state.iqamah.clone())
    }

    fn tarawih(&self) -> TarawihConfig {
        self.read().tarawih.clone()
    }

    fn set_tarawih(&self, enabled: bool, time: &str) -> Result<TarawihConfig, MiqatError> {
        let spec = TimeSpec::parse(time, Prayer::Isha)?;
        check_offset(spec, Prayer::Isha, MAX_TARAWIH_OFFSET, "Tarawih")?;

        let mut state = self.write();
        state.tarawih = TarawihConfig { enabled, time: spec, updated_at: Some(Utc::now()) };
        Ok(state.tarawih.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let store = InMemoryOverrideStore::new();
        let o = store.create_override(jan15(), Prayer::Maghrib, "18:10", "Community iftar").unwrap();
        assert!(o.is_active);
        assert_eq!(o.time, NaiveTime::from_hms_opt(18, 10, 0).unwrap());
        assert_eq!(store.get_override(o.id), Some(o.clone()));
        assert_eq!(store.overrides_for(jan15()), vec![o]);
    }

    #[test]
    fn test_second_override_supersedes() {
        let store = InMemoryOverrideStore::new();
        let first = store.create_override(jan15(), Prayer::Maghrib, "18:10", "").unwrap();
        let second = store.create_override(jan15(), Prayer::Maghrib, "18:20", "").unwrap();

        let active = store.overrides_for(jan15());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert!(!store.get_override(first.id).unwrap().is_active);
        assert_eq!(store.list_overrides().len(), 2);
    }

    #[test]
    fn test_reactivation_supersedes_current() {
        let store = InMemoryOverrideStore::new();
        let first = store.create_override(jan15(), Prayer::Isha, "19:30", "").unwrap();
        let second = store.create_override(jan15(), Prayer::Isha, "19:45", "").unwrap();

        store
            .update_override(first.id, OverrideUpdate { is_active: Some(true), ..Default::default() })
            .unwrap();
        let active = store.overrides_for(jan15());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
        assert!(!store.get_override(second.id).unwrap().is_active);
    }

    #[test]
    fn test_deactivate_and_delete() {
        let store = InMemoryOverrideStore::new();
        let o = store.create_override(jan15(), Prayer::Asr, "15:45", "").unwrap();
        let off = store.deactivate_override(o.id).unwrap();
        assert!(!off.is_active);
        assert!(store.overrides_for(jan15()).is_empty());

        store.delete_override(o.id).unwrap();
        assert!(store.get_override(o.id).is_none());
        assert!(store.delete_override(o.id).unwrap_err().is_override_validation());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let store = InMemoryOverrideStore::new();
        assert!(store.create_override(jan15(), Prayer::Maghrib, "6pm", "").unwrap_err().is_override_validation());
        assert!(store.create_override(jan15(), Prayer::Sunrise, "07:00", "").unwrap_err().is_override_validation());
        assert!(store.list_overrides().is_empty());
    }

    #[test]
    fn test_update_bad_time_leaves_record() {
        let store = InMemoryOverrideStore::new();
        let o = store.create_override(jan15(), Prayer::Dhuhr, "13:00", "Jumuah").unwrap();
        let err = store
            .update_override(o.id, OverrideUpdate { time: Some("1pm".into()), ..Default::default() })
            .unwrap_err();
        assert!(err.is_override_validation());
        assert_eq!(store.get_override(o.id).unwrap().time, o.time);
    }

    #[test]
    fn test_iqamah_validation() {
        let store = InMemoryOverrideStore::new();
        let iqamah = store.set_iqamah(Prayer::Fajr, "+25").unwrap();
        assert_eq!(iqamah.fajr, TimeSpec::after(Prayer::Fajr, 25));
        assert!(iqamah.updated_at.is_some());

        let iqamah = store.set_iqamah(Prayer::Dhuhr, "13:30").unwrap();
        assert!(iqamah.dhuhr.is_absolute());

        for bad in ["+121", "-5", "+5 after Isha", "soon"] {
            assert!(store.set_iqamah(Prayer::Asr, bad).unwrap_err().is_override_validation(), "{bad}");
        }
        assert!(store.set_iqamah(Prayer::Sunrise, "+5").is_err());
        assert_eq!(store.iqamah().asr, IqamahTimes::default().asr);
    }

    #[test]
    fn test_tarawih_validation() {
        let store = InMemoryOverrideStore::new();
        let t = store.set_tarawih(false, "+30 after Isha").unwrap();
        assert_eq!(t.time, TimeSpec::after(Prayer::Isha, 30));
        assert!(store.set_tarawih(true, "+200").is_err());
        assert!(store.set_tarawih(true, "+10 after Maghrib").is_err());
        assert_eq!(store.tarawih().time, TimeSpec::after(Prayer::Isha, 30));
    }

    #[test]
    fn test_tarawih_visibility() {
        let config = TarawihConfig::default();
        assert!(config.is_visible(HijriDay::new(1446, 9, 15)));
        assert!(!config.is_visible(HijriDay::new(1446, 10, 1)));
        let forced = TarawihConfig { enabled: true, ..config };
        assert!(forced.is_visible(HijriDay::new(1446, 10, 1)));
    }

    #[test]
    fn test_clones_share_state() {
        let store = InMemoryOverrideStore::new();
        let other = store.clone();
        store.create_override(jan15(), Prayer::Fajr, "06:00", "").unwrap();
        assert_eq!(other.overrides_for(jan15()).len(), 1);
    }
}
