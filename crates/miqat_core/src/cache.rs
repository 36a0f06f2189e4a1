//! Time-boxed cache of raw (pre-override) schedules.

use chrono::{DateTime, Days, NaiveDate, Utc};
use miqat_types::{CalculationMethod, Location, RawSchedule, resolve_local};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key: a coarse grid cell, the date and the method.
///
/// Nearby requests in the same cell share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_cell: i64,
    lng_cell: i64,
    date: NaiveDate,
    method: CalculationMethod,
}

impl CacheKey {
    pub fn new(location: &Location, date: NaiveDate, method: CalculationMethod, grid_degrees: f64) -> Self {
        Self {
            lat_cell: (location.lat / grid_degrees).floor() as i64,
            lng_cell: (location.lng / grid_degrees).floor() as i64,
            date,
            method,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    schedule: RawSchedule,
    expires_at: DateTime<Utc>,
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent raw-schedule cache.
///
/// Readers never block each other. Writes go through
/// [`insert_if_absent_or_expired`](Self::insert_if_absent_or_expired):
/// the first writer for a key wins and later writers get the stored entry.
#[derive(Debug, Clone)]
pub struct ScheduleCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    grid_degrees: f64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ScheduleCache {
    pub fn new(grid_degrees: f64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            grid_degrees,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn key(&self, location: &Location, date: NaiveDate, method: CalculationMethod) -> CacheKey {
        CacheKey::new(location, date, method, self.grid_degrees)
    }

    /// Returns a fresh entry, if any.
    pub async fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<RawSchedule> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(date = %key.date, method = %key.method.id(), layer = %entry.schedule.source, "Cache hit");
                Some(entry.schedule.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(date = %key.date, method = %key.method.id(), "Cache miss");
                None
            }
        }
    }

    /// Stores `schedule` unless a fresh entry already exists, and returns
    /// whichever entry is now cached.
    ///
    /// Expiry is `now + ttl` or the next local midnight, whichever
    /// comes first.
    pub async fn insert_if_absent_or_expired(
        &self,
        key: CacheKey,
        schedule: RawSchedule,
        location: &Location,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> RawSchedule {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&key).filter(|e| e.expires_at > now) {
            debug!(date = %key.date, "Concurrent insert lost, keeping cached entry");
            return existing.schedule.clone();
        }

        let expires_at = expiry(location, ttl, now);
        debug!(date = %key.date, layer = %schedule.source, %expires_at, "Cached schedule");
        entries.insert(key, CacheEntry { schedule: schedule.clone(), expires_at });
        schedule
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        debug!(removed, remaining = entries.len(), "Purged expired cache entries");
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Earlier of `now + ttl` and the next local midnight after `now`.
fn expiry(location: &Location, ttl: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let by_ttl = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let midnight = now
        .with_timezone(&location.timezone)
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|next| resolve_local(location.timezone, next.and_time(chrono::NaiveTime::MIN)).with_timezone(&Utc))
        .unwrap_or(by_ttl);
    by_ttl.min(midnight)
}
