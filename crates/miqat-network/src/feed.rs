//! Mosque-hosted JSON timetable feed.
//!
//! `GET {base}/{YYYY-MM-DD}?lat=..&lng=..&method=..` answering
//!
//! ```json
//! { "timezone": "America/New_York", "fajr": "06:01", "sunrise": "07:41",
//!   "dhuhr": "12:47", "asr": "15:40", "maghrib": "17:53", "isha": "19:10" }
//! ```
//!
//! `imsak`, `sunset` and `midnight` are optional.

use async_trait::async_trait;
use chrono_tz::Tz;
use miqat_types::RawTimes;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{DEFAULT_TIMEOUT, LocalTimings, ProviderRequest, TimeProvider, build_client, get_json};

#[derive(Debug, Deserialize)]
struct FeedDay {
    timezone: Option<String>,
    imsak: Option<String>,
    fajr: String,
    sunrise: String,
    dhuhr: String,
    asr: String,
    sunset: Option<String>,
    maghrib: String,
    isha: String,
    midnight: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TimetableFeedProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl TimetableFeedProvider {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(name, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: build_client(timeout)?,
        })
    }

    /// Sends the key as a bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl TimeProvider for TimetableFeedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, request: &ProviderRequest) -> Result<RawTimes, ProviderError> {
        let url = format!("{}/{}", self.base_url, request.date.format("%Y-%m-%d"));
        debug!(provider = %self.name, %url, "Requesting timetable");

        let query = [
            ("lat", request.location.lat.to_string()),
            ("lng", request.location.lng.to_string()),
            ("method", request.method.id().to_string()),
        ];
        let mut builder = self.client.get(&url).query(&query);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let day: FeedDay = get_json(builder).await?;

        let tz = match day.timezone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ProviderError::invalid(format!("Unknown timezone '{}'", name)))?,
            None => request.location.timezone,
        };

        LocalTimings {
            imsak: day.imsak.as_deref(),
            fajr: &day.fajr,
            sunrise: &day.sunrise,
            dhuhr: &day.dhuhr,
            asr: &day.asr,
            sunset: day.sunset.as_deref(),
            maghrib: &day.maghrib,
            isha: &day.isha,
            midnight: day.midnight.as_deref(),
        }
        .to_raw_times(request.date, tz)
    }
}
