#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use miqat_core::{
    CalculationMethod, EngineConfig, InMemoryOverrideStore, Location, ProviderError, ProviderRequest, RawTimes,
    TimeProvider, Tz, calculate_prayer_times,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn doraville() -> Location {
    Location::new(33.9114, -84.2614, Tz::America__New_York).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Answers with the local calculation for the requested method.
#[derive(Debug)]
pub struct FixedProvider {
    name: String,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimeProvider for FixedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, request: &ProviderRequest) -> Result<RawTimes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let params = request.method.params().ok_or(ProviderError::UnsupportedMethod(request.method))?;
        calculate_prayer_times(request.date, &request.location, &params)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Always fails with the given error.
#[derive(Debug)]
pub struct FailingProvider {
    name: String,
    error: ProviderError,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(name: &str, error: ProviderError) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), error, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimeProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _request: &ProviderRequest) -> Result<RawTimes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Never answers within any reasonable timeout.
#[derive(Debug)]
pub struct HangingProvider;

#[async_trait]
impl TimeProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn fetch(&self, _request: &ProviderRequest) -> Result<RawTimes, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ProviderError::Timeout)
    }
}

pub fn engine_with(providers: Vec<Arc<dyn TimeProvider>>) -> miqat_core::PrayerEngine {
    engine_with_config(EngineConfig::default(), providers)
}

pub fn engine_with_config(
    config: EngineConfig,
    providers: Vec<Arc<dyn TimeProvider>>,
) -> miqat_core::PrayerEngine {
    miqat_core::PrayerEngine::with_parts(config, providers, Arc::new(InMemoryOverrideStore::new()))
}

pub const ISNA: CalculationMethod = CalculationMethod::Isna;
