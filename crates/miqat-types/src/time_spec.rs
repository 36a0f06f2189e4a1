//! Clock times and relative offsets entered by administrators.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{MiqatError, Prayer};

/// An absolute local clock time or an offset from another prayer's Adhan.
///
/// Parsed once at the store boundary; readers never see the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSpec {
    Absolute(NaiveTime),
    OffsetMinutes { minutes: i64, reference: Prayer },
}

impl TimeSpec {
    pub fn after(reference: Prayer, minutes: i64) -> Self {
        Self::OffsetMinutes { minutes, reference }
    }

    /// Parses `"HH:MM"`, `"+N"`, `"+N after Isha"` or `"N minutes after Isha"`.
    ///
    /// A bare offset is relative to `default_reference`.
    pub fn parse(input: &str, default_reference: Prayer) -> Result<Self, MiqatError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MiqatError::invalid_override("empty time expression"));
        }

        if trimmed.contains(':') {
            return parse_clock(trimmed).map(Self::Absolute);
        }

        let mut tokens = trimmed.split_whitespace();
        let amount = tokens.next().unwrap_or_default();
        let minutes: i64 = amount
            .strip_prefix('+')
            .unwrap_or(amount)
            .parse()
            .map_err(|_| MiqatError::invalid_override(format!("'{}' is not a minute offset", input)))?;

        let mut reference = default_reference;
        let mut rest: Vec<&str> = tokens.collect();
        if let Some(first) = rest.first() {
            if matches!(first.to_ascii_lowercase().as_str(), "m" | "min" | "mins" | "minute" | "minutes") {
                rest.remove(0);
            }
        }
        match rest.as_slice() {
            [] => {}
            [after, prayer] if after.eq_ignore_ascii_case("after") => {
                reference = prayer.parse().map_err(|_| {
                    MiqatError::invalid_override(format!("unknown reference prayer '{}'", prayer))
                })?;
            }
            _ => {
                return Err(MiqatError::invalid_override(format!(
                    "unrecognized time expression '{}'",
                    input
                )));
            }
        }

        Ok(Self::OffsetMinutes { minutes, reference })
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Self::Absolute(_))
    }
}

/// Parses a 24-hour `"HH:MM"` or `"HH:MM:SS"` clock time.
pub fn parse_clock(input: &str) -> Result<NaiveTime, MiqatError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| MiqatError::invalid_override(format!("'{}' is not a HH:MM clock time", input)))
}

/// Interprets a wall-clock time in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap resolve forward to the first valid instant.
pub fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let mut candidate = local;
            // No zone has a gap longer than a few hours.
            for _ in 0..(24 * 60) {
                candidate += Duration::minutes(1);
                if let Some(t) = tz.from_local_datetime(&candidate).earliest() {
                    return t;
                }
            }
            tz.from_utc_datetime(&local)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(t) => write!(f, "{}", t.format("%H:%M")),
            Self::OffsetMinutes { minutes, reference } => {
                write!(f, "{:+} after {}", minutes, reference)
            }
        }
    }
}
