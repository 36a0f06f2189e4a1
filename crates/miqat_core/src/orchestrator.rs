//! Layered resolution of raw prayer times.
//!
//! Cache, then each remote provider in priority order, then the local
//! calculator, then the bundled offline table. Every result carries the
//! layer that produced it. Overrides are not applied here.

use chrono::{NaiveDate, Utc};
use miqat_astronomy::calculate_prayer_times;
use miqat_network::{ProviderRequest, TimeProvider};
use miqat_types::{CalculationMethod, Location, RawSchedule, SourceLayer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::ScheduleCache;
use crate::config::EngineConfig;
use crate::offline::offline_schedule;

/// Outcome of the provider chain.
enum RemoteOutcome {
    Found(RawSchedule),
    Exhausted,
    Cancelled,
}

/// Tries each layer in turn until one answers.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn TimeProvider>>,
    cache: ScheduleCache,
    config: Arc<EngineConfig>,
}

impl FallbackOrchestrator {
    pub fn new(providers: Vec<Arc<dyn TimeProvider>>, cache: ScheduleCache, config: Arc<EngineConfig>) -> Self {
        Self { providers, cache, config }
    }

    pub fn providers(&self) -> &[Arc<dyn TimeProvider>] {
        &self.providers
    }

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    /// Always returns a schedule. Cancellation stops the provider chain
    /// and falls through to local calculation; such results are not cached.
    pub async fn resolve(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
        cancel: &CancellationToken,
    ) -> RawSchedule {
        let key = self.cache.key(location, date, method);
        if let Some(hit) = self.cache.get(&key, Utc::now()).await {
            return hit;
        }

        let (schedule, cacheable) = match self.try_providers(location, date, method, cancel).await {
            RemoteOutcome::Found(schedule) => (schedule, true),
            RemoteOutcome::Exhausted => {
                if !self.providers.is_empty() {
                    warn!(%date, "All providers failed, falling back to local calculation");
                }
                (self.compute_locally(location, date, method), true)
            }
            RemoteOutcome::Cancelled => {
                info!(%date, "Resolution cancelled, serving local calculation");
                (self.compute_locally(location, date, method), false)
            }
        };

        if !cacheable {
            return schedule;
        }
        let ttl = if schedule.source.is_remote() { self.config.cache_ttl() } else { self.config.fallback_ttl() };
        self.cache.insert_if_absent_or_expired(key, schedule, location, ttl, Utc::now()).await
    }

    async fn try_providers(
        &self,
        location: &Location,
        date: NaiveDate,
        method: CalculationMethod,
        cancel: &CancellationToken,
    ) -> RemoteOutcome {
        let request = ProviderRequest::new(*location, date, method).with_asr_school(self.config.asr_school);
        let timeout = self.config.provider_timeout();

        for provider in &self.providers {
            if cancel.is_cancelled() {
                return RemoteOutcome::Cancelled;
            }
            let name = provider.name();
            debug!(provider = %name, %date, "Trying provider");

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return RemoteOutcome::Cancelled,
                result = tokio::time::timeout(timeout, provider.fetch(&request)) => result,
            };

            match attempt {
                Ok(Ok(times)) => {
                    debug!(provider = %name, %date, "Provider answered");
                    return RemoteOutcome::Found(RawSchedule {
                        date,
                        method,
                        times,
                        source: SourceLayer::RemoteProvider(name.to_string()),
                    });
                }
                Ok(Err(e)) => warn!(provider = %name, kind = e.kind(), error = %e, "Provider failed"),
                Err(_) => warn!(provider = %name, timeout_ms = timeout.as_millis() as u64, "Provider timed out"),
            }
        }
        RemoteOutcome::Exhausted
    }

    /// Local calculation, or the offline table if the calculator cannot run.
    pub fn compute_locally(&self, location: &Location, date: NaiveDate, method: CalculationMethod) -> RawSchedule {
        let Some(params) = self.config.method_params(method) else {
            error!(method = %method.id(), "No parameters for method, serving offline schedule");
            return offline_schedule(location, date, method);
        };

        match calculate_prayer_times(date, location, &params) {
            Ok(times) => RawSchedule { date, method, times, source: SourceLayer::LocalCalculation },
            Err(e) => {
                error!(error = %e, %date, lat = location.lat, "Calculation failed, serving offline schedule");
                offline_schedule(location, date, method)
            }
        }
    }
}
