//! Engine configuration.
//!
//! Every setting has a default so the engine can start with zero
//! configuration; with no providers listed it serves local calculations.

use miqat_calendar::HijriCalendar;
use miqat_network::{AladhanProvider, DEFAULT_TIMEOUT, TimeProvider, TimetableFeedProvider};
use miqat_types::{AsrSchool, CalculationMethod, HighLatitudeRule, Location, MethodParams, MiqatError, Tz};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Largest moon-sighting correction accepted, in days.
pub const MAX_HIJRI_ADJUSTMENT: i64 = 2;

/// Which adapter a provider entry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Aladhan,
    TimetableFeed,
}

/// One entry of the provider priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used by `resolve_default`.
    /// Env: `MIQAT_LATITUDE`, `MIQAT_LONGITUDE`, `MIQAT_TIMEZONE`, `MIQAT_ELEVATION`
    /// Default: Makkah
    pub default_location: Location,

    /// Env: `MIQAT_METHOD`
    /// Default: Muslim World League
    pub default_method: CalculationMethod,

    /// Env: `MIQAT_ASR_SCHOOL` (`standard` / `hanafi`)
    pub asr_school: AsrSchool,

    /// Replaces every method's high-latitude rule when set.
    /// Env: `MIQAT_HIGH_LATITUDE_RULE`
    pub high_latitude_rule: Option<HighLatitudeRule>,

    /// Env: `MIQAT_HIJRI_CALENDAR` (`tabular` / `umm_al_qura`)
    pub hijri_calendar: HijriCalendar,

    /// Days added before Hijri conversion, clamped to [-2, 2].
    /// Env: `MIQAT_HIJRI_ADJUSTMENT`
    pub hijri_adjustment: i64,

    /// Env: `MIQAT_PROVIDER_TIMEOUT_MS`
    /// Default: 3000
    pub provider_timeout_ms: u64,

    /// Upper bound on how long a remote result is served from cache.
    /// Env: `MIQAT_CACHE_TTL_SECS`
    /// Default: 24 hours
    pub cache_ttl_secs: u64,

    /// Cache lifetime for local and offline results, so remote providers
    /// are retried once they recover.
    /// Env: `MIQAT_FALLBACK_TTL_SECS`
    /// Default: 15 minutes
    pub fallback_ttl_secs: u64,

    /// Cache grid cell size in degrees.
    /// Env: `MIQAT_CACHE_GRID_DEGREES`
    /// Default: 0.1
    pub cache_grid_degrees: f64,

    /// Tried in order.
    /// Env: `MIQAT_ALADHAN_URL`, `MIQAT_FEED_URL` + `MIQAT_FEED_API_KEY`
    pub providers: Vec<ProviderConfig>,

    /// Parameters for [`CalculationMethod::Custom`].
    pub custom_params: Option<MethodParams>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_location: Location::new_unchecked(21.4225, 39.8262, Tz::Asia__Riyadh),
            default_method: CalculationMethod::MuslimWorldLeague,
            asr_school: AsrSchool::Standard,
            high_latitude_rule: None,
            hijri_calendar: HijriCalendar::Tabular,
            hijri_adjustment: 0,
            provider_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            cache_ttl_secs: 24 * 60 * 60,
            fallback_ttl_secs: 15 * 60,
            cache_grid_degrees: 0.1,
            providers: Vec::new(),
            custom_params: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        fn parsed<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %value, "Invalid value, using default");
                    None
                }
            }
        }
        fn named<T: DeserializeOwned>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
            match serde_json::from_value(serde_json::Value::String(normalized)) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %value, "Invalid value, using default");
                    None
                }
            }
        }

        let mut location = config.default_location;
        if let Some(lat) = parsed("MIQAT_LATITUDE", lookup("MIQAT_LATITUDE")) {
            location.lat = lat;
        }
        if let Some(lng) = parsed("MIQAT_LONGITUDE", lookup("MIQAT_LONGITUDE")) {
            location.lng = lng;
        }
        if let Some(tz) = parsed::<Tz>("MIQAT_TIMEZONE", lookup("MIQAT_TIMEZONE")) {
            location.timezone = tz;
        }
        if let Some(elevation) = parsed("MIQAT_ELEVATION", lookup("MIQAT_ELEVATION")) {
            location.elevation = elevation;
        }
        match location.validate() {
            Ok(()) => config.default_location = location,
            Err(e) => warn!(error = %e, "Invalid default location, using default"),
        }

        if let Some(method) = parsed("MIQAT_METHOD", lookup("MIQAT_METHOD")) {
            config.default_method = method;
        }
        if let Some(school) = named("MIQAT_ASR_SCHOOL", lookup("MIQAT_ASR_SCHOOL")) {
            config.asr_school = school;
        }
        if let Some(rule) = named("MIQAT_HIGH_LATITUDE_RULE", lookup("MIQAT_HIGH_LATITUDE_RULE")) {
            config.high_latitude_rule = Some(rule);
        }
        if let Some(calendar) = named("MIQAT_HIJRI_CALENDAR", lookup("MIQAT_HIJRI_CALENDAR")) {
            config.hijri_calendar = calendar;
        }
        if let Some(adjustment) = parsed("MIQAT_HIJRI_ADJUSTMENT", lookup("MIQAT_HIJRI_ADJUSTMENT")) {
            config.hijri_adjustment = adjustment;
        }
        if let Some(ms) = parsed("MIQAT_PROVIDER_TIMEOUT_MS", lookup("MIQAT_PROVIDER_TIMEOUT_MS")) {
            config.provider_timeout_ms = ms;
        }
        if let Some(secs) = parsed("MIQAT_CACHE_TTL_SECS", lookup("MIQAT_CACHE_TTL_SECS")) {
            config.cache_ttl_secs = secs;
        }
        if let Some(secs) = parsed("MIQAT_FALLBACK_TTL_SECS", lookup("MIQAT_FALLBACK_TTL_SECS")) {
            config.fallback_ttl_secs = secs;
        }
        if let Some(grid) = parsed("MIQAT_CACHE_GRID_DEGREES", lookup("MIQAT_CACHE_GRID_DEGREES")) {
            config.cache_grid_degrees = grid;
        }

        if let Some(url) = lookup("MIQAT_ALADHAN_URL") {
            config.providers.push(ProviderConfig {
                kind: ProviderKind::Aladhan,
                name: "aladhan".to_string(),
                base_url: url,
                api_key: None,
            });
        }
        if let Some(url) = lookup("MIQAT_FEED_URL") {
            config.providers.push(ProviderConfig {
                kind: ProviderKind::TimetableFeed,
                name: "timetable-feed".to_string(),
                base_url: url,
                api_key: lookup("MIQAT_FEED_API_KEY"),
            });
        }

        config.normalized()
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, MiqatError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MiqatError::invalid_input(format!("Invalid engine configuration: {}", e)))?;
        config.default_location.validate()?;
        Ok(config.normalized())
    }

    /// Clamps out-of-range values, logging each correction.
    fn normalized(mut self) -> Self {
        let clamped = self.hijri_adjustment.clamp(-MAX_HIJRI_ADJUSTMENT, MAX_HIJRI_ADJUSTMENT);
        if clamped != self.hijri_adjustment {
            warn!(value = self.hijri_adjustment, clamped, "Hijri adjustment out of range");
            self.hijri_adjustment = clamped;
        }
        if !self.cache_grid_degrees.is_finite() || self.cache_grid_degrees <= 0.0 || self.cache_grid_degrees > 5.0 {
            warn!(value = self.cache_grid_degrees, "Cache grid out of range, using 0.1");
            self.cache_grid_degrees = 0.1;
        }
        if self.provider_timeout_ms == 0 {
            warn!("Provider timeout of 0 ms, using default");
            self.provider_timeout_ms = Self::default().provider_timeout_ms;
        }
        if self.fallback_ttl_secs > self.cache_ttl_secs {
            self.fallback_ttl_secs = self.cache_ttl_secs;
        }
        self
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }

    /// Effective calculator parameters: the method's canonical table (or
    /// `custom_params` for `Custom`) with the configured Asr school and
    /// high-latitude rule applied.
    pub fn method_params(&self, method: CalculationMethod) -> Option<MethodParams> {
        let base = match method {
            CalculationMethod::Custom => self.custom_params?,
            other => other.params()?,
        };
        let params = base.with_asr_school(self.asr_school);
        Some(match self.high_latitude_rule {
            Some(rule) => params.with_high_latitude_rule(rule),
            None => params,
        })
    }

    /// Instantiates the provider list in priority order. Entries whose
    /// client cannot be built are skipped with a warning.
    pub fn build_providers(&self) -> Vec<Arc<dyn TimeProvider>> {
        let timeout = self.provider_timeout();
        self.providers
            .iter()
            .filter_map(|entry| {
                let built: Result<Arc<dyn TimeProvider>, _> = match entry.kind {
                    ProviderKind::Aladhan => AladhanProvider::with_base_url(&entry.base_url, timeout)
                        .map(|p| Arc::new(p.named(&entry.name)) as Arc<dyn TimeProvider>),
                    ProviderKind::TimetableFeed => {
                        TimetableFeedProvider::with_timeout(&entry.name, &entry.base_url, timeout).map(|p| {
                            let p = match &entry.api_key {
                                Some(key) => p.with_api_key(key),
                                None => p,
                            };
                            Arc::new(p) as Arc<dyn TimeProvider>
                        })
                    }
                };
                built
                    .map_err(|e| warn!(provider = %entry.name, error = %e, "Skipping provider"))
                    .ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config, EngineConfig::default());
        assert!(config.build_providers().is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MIQAT_LATITUDE", "33.9114"),
            ("MIQAT_LONGITUDE", "-84.2614"),
            ("MIQAT_TIMEZONE", "America/New_York"),
            ("MIQAT_METHOD", "isna"),
            ("MIQAT_ASR_SCHOOL", "Hanafi"),
            ("MIQAT_HIGH_LATITUDE_RULE", "one-seventh"),
            ("MIQAT_HIJRI_CALENDAR", "umm_al_qura"),
            ("MIQAT_HIJRI_ADJUSTMENT", "-1"),
            ("MIQAT_ALADHAN_URL", "https://api.aladhan.com"),
        ]));
        assert_eq!(config.default_location.timezone, Tz::America__New_York);
        assert_eq!(config.default_method, CalculationMethod::Isna);
        assert_eq!(config.asr_school, AsrSchool::Hanafi);
        assert_eq!(config.high_latitude_rule, Some(HighLatitudeRule::OneSeventh));
        assert_eq!(config.hijri_calendar, HijriCalendar::UmmAlQura);
        assert_eq!(config.hijri_adjustment, -1);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.build_providers()[0].name(), "aladhan");
    }

    #[test]
    fn test_default_timeout_matches_adapters() {
        assert_eq!(EngineConfig::default().provider_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_env_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MIQAT_LATITUDE", "123.0"),
            ("MIQAT_METHOD", "sundial"),
            ("MIQAT_PROVIDER_TIMEOUT_MS", "fast"),
            ("MIQAT_HIJRI_ADJUSTMENT", "7"),
        ]));
        assert_eq!(config.default_location, EngineConfig::default().default_location);
        assert_eq!(config.default_method, CalculationMethod::MuslimWorldLeague);
        assert_eq!(config.provider_timeout_ms, 3_000);
        assert_eq!(config.hijri_adjustment, MAX_HIJRI_ADJUSTMENT);
    }

    #[test]
    fn test_from_json() {
        let config = EngineConfig::from_json(
            r#"{
                "default_location": { "lat": -6.2088, "lng": 106.8456, "timezone": "Asia/Jakarta" },
                "default_method": "mabims",
                "providers": [
                    { "kind": "timetable_feed", "name": "masjid", "base_url": "https://example.org/times", "api_key": "k" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_method, CalculationMethod::Mabims);
        assert_eq!(config.default_location.elevation, 0.0);
        assert_eq!(config.cache_grid_degrees, 0.1);
        assert_eq!(config.build_providers()[0].name(), "masjid");
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(EngineConfig::from_json("{ not json").unwrap_err().is_invalid_input());
        let bad_location = r#"{ "default_location": { "lat": 95.0, "lng": 0.0, "timezone": "UTC" } }"#;
        assert!(EngineConfig::from_json(bad_location).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_method_params_applies_overrides() {
        let config = EngineConfig {
            asr_school: AsrSchool::Hanafi,
            high_latitude_rule: Some(HighLatitudeRule::MiddleOfNight),
            ..Default::default()
        };
        let params = config.method_params(CalculationMethod::Isna).unwrap();
        assert_eq!(params.fajr_angle, 15.0);
        assert_eq!(params.asr_school, AsrSchool::Hanafi);
        assert_eq!(params.high_latitude_rule, HighLatitudeRule::MiddleOfNight);
        assert!(config.method_params(CalculationMethod::Custom).is_none());
    }
}
