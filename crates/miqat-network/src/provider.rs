//! The uniform provider interface and helpers shared by the adapters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use miqat_types::{AsrSchool, CalculationMethod, Location, RawTimes, parse_clock, resolve_local};
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::{ProviderError, status_error};

/// Default per-request timeout for provider HTTP clients.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

const USER_AGENT: &str = concat!("miqat/", env!("CARGO_PKG_VERSION"), " (prayer time resolution)");

/// What a provider is asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub location: Location,
    pub date: NaiveDate,
    pub method: CalculationMethod,
    pub asr_school: AsrSchool,
}

impl ProviderRequest {
    pub fn new(location: Location, date: NaiveDate, method: CalculationMethod) -> Self {
        Self { location, date, method, asr_school: AsrSchool::Standard }
    }

    pub fn with_asr_school(mut self, school: AsrSchool) -> Self {
        self.asr_school = school;
        self
    }
}

/// One external time-calculation service.
///
/// Implementations make a single attempt per call and report failure as a
/// [`ProviderError`]; retries and fall-through belong to the caller.
#[async_trait]
pub trait TimeProvider: Send + Sync + fmt::Debug {
    /// Name used for the `RemoteProvider` source tag.
    fn name(&self) -> &str;

    async fn fetch(&self, request: &ProviderRequest) -> Result<RawTimes, ProviderError>;
}

/// Builds the HTTP client shared by the adapters.
pub fn build_client(timeout: std::time::Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Unreachable(format!("Failed to create HTTP client: {}", e)))
}

/// Sends a request and decodes a JSON body, mapping status codes first.
pub(crate) async fn get_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status));
    }
    response.json().await.map_err(|e| {
        if e.is_decode() {
            ProviderError::invalid(format!("Malformed body: {}", e))
        } else {
            e.into()
        }
    })
}

/// Local wall-clock strings as most providers report them.
#[derive(Debug, Clone, Default)]
pub(crate) struct LocalTimings<'a> {
    pub imsak: Option<&'a str>,
    pub fajr: &'a str,
    pub sunrise: &'a str,
    pub dhuhr: &'a str,
    pub asr: &'a str,
    pub sunset: Option<&'a str>,
    pub maghrib: &'a str,
    pub isha: &'a str,
    pub midnight: Option<&'a str>,
}

impl LocalTimings<'_> {
    /// Converts to UTC instants, rolling late-evening times past midnight
    /// onto the next day, and rejects out-of-order schedules.
    pub fn to_raw_times(&self, date: NaiveDate, tz: Tz) -> Result<RawTimes, ProviderError> {
        let at = |s: &str| -> Result<NaiveDateTime, ProviderError> { Ok(date.and_time(parse_time(s)?)) };

        let fajr = at(self.fajr)?;
        let sunrise = at(self.sunrise)?;
        let dhuhr = at(self.dhuhr)?;
        let after_noon = |t: NaiveDateTime| if t < dhuhr { t + Duration::days(1) } else { t };

        let asr = after_noon(at(self.asr)?);
        let maghrib = after_noon(at(self.maghrib)?);
        let sunset = match self.sunset {
            Some(s) => after_noon(at(s)?),
            None => maghrib,
        };
        let isha = after_noon(at(self.isha)?);
        let imsak = match self.imsak {
            Some(s) => {
                let t = at(s)?;
                if t > fajr { t - Duration::days(1) } else { t }
            }
            None => fajr - Duration::minutes(10),
        };
        let midnight = match self.midnight {
            Some(s) => {
                let t = at(s)?;
                if t < sunset { t + Duration::days(1) } else { t }
            }
            None => sunset + (sunrise + Duration::days(1) - sunset) / 2,
        };

        let times = RawTimes {
            imsak: localize(tz, imsak),
            fajr: localize(tz, fajr),
            sunrise: localize(tz, sunrise),
            dhuhr: localize(tz, dhuhr),
            asr: localize(tz, asr),
            sunset: localize(tz, sunset),
            maghrib: localize(tz, maghrib),
            isha: localize(tz, isha),
            midnight: localize(tz, midnight),
        };

        if !times.is_ordered() {
            return Err(ProviderError::invalid(format!("Times for {} are out of order", date)));
        }
        Ok(times)
    }
}

/// Parses `"05:42"` or `"05:42 (EST)"`.
fn parse_time(value: &str) -> Result<chrono::NaiveTime, ProviderError> {
    let clock = value.split_whitespace().next().unwrap_or_default();
    parse_clock(clock).map_err(|_| ProviderError::invalid(format!("Unparsable time '{}'", value)))
}

pub(crate) fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    resolve_local(tz, local).with_timezone(&Utc)
}
