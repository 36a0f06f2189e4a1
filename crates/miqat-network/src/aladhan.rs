//! Aladhan timings API adapter.
//!
//! `GET {base}/v1/timings/{DD-MM-YYYY}?latitude=..&longitude=..&method=..&school=..&timezonestring=..`

use async_trait::async_trait;
use chrono_tz::Tz;
use miqat_types::{AsrSchool, CalculationMethod, RawTimes};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{DEFAULT_TIMEOUT, LocalTimings, ProviderRequest, TimeProvider, build_client, get_json};

/// Public Aladhan endpoint.
pub const ALADHAN_BASE_URL: &str = "https://api.aladhan.com";

#[derive(Debug, Deserialize)]
struct AladhanResponse {
    code: u16,
    data: AladhanData,
}

#[derive(Debug, Deserialize)]
struct AladhanData {
    timings: AladhanTimings,
    meta: Option<AladhanMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AladhanTimings {
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

#[derive(Debug, Deserialize)]
struct AladhanMeta {
    timezone: Option<String>,
}

/// Aladhan's numeric identifier for a method.
pub fn aladhan_method_id(method: CalculationMethod) -> Option<u8> {
    match method {
        CalculationMethod::Jafari => Some(0),
        CalculationMethod::Karachi => Some(1),
        CalculationMethod::Isna => Some(2),
        CalculationMethod::MuslimWorldLeague => Some(3),
        CalculationMethod::UmmAlQura => Some(4),
        CalculationMethod::Egyptian => Some(5),
        CalculationMethod::Tehran => Some(7),
        CalculationMethod::Mabims => Some(11),
        CalculationMethod::Custom => None,
    }
}

#[derive(Debug, Clone)]
pub struct AladhanProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl AladhanProvider {
    /// Provider against the public endpoint.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(ALADHAN_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "aladhan".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    /// Renames the provider, for configurations listing several Aladhan mirrors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl TimeProvider for AladhanProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, request: &ProviderRequest) -> Result<RawTimes, ProviderError> {
        let method_id =
            aladhan_method_id(request.method).ok_or(ProviderError::UnsupportedMethod(request.method))?;
        let school = match request.asr_school {
            AsrSchool::Standard => 0,
            AsrSchool::Hanafi => 1,
        };
        let url = format!("{}/v1/timings/{}", self.base_url, request.date.format("%d-%m-%Y"));
        debug!(provider = %self.name, %url, "Requesting timings");

        let query = [
            ("latitude", request.location.lat.to_string()),
            ("longitude", request.location.lng.to_string()),
            ("method", method_id.to_string()),
            ("school", school.to_string()),
            ("timezonestring", request.location.timezone.name().to_string()),
        ];
        let response: AladhanResponse = get_json(self.client.get(&url).query(&query)).await?;
        if response.code != 200 {
            return Err(ProviderError::invalid(format!("Aladhan returned code {}", response.code)));
        }

        // Times are reported in the zone the service resolved, which normally echoes ours.
        let tz = response
            .data
            .meta
            .and_then(|m| m.timezone)
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(request.location.timezone);

        let t = &response.data.timings;
        LocalTimings {
            imsak: t.imsak.as_deref(),
            fajr: &t.fajr,
            sunrise: &t.sunrise,
            dhuhr: &t.dhuhr,
            asr: &t.asr,
            sunset: t.sunset.as_deref(),
            maghrib: &t.maghrib,
            isha: &t.isha,
            midnight: t.midnight.as_deref(),
        }
        .to_raw_times(request.date, tz)
    }
}
