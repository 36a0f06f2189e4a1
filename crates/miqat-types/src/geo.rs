//! Geographic types.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::MiqatError;

/// An observer's position and the timezone used for display.
///
/// Immutable input value; two locations with equal fields are the same location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    /// Elevation above sea level in meters. Default: 0.0
    #[serde(default)]
    pub elevation: f64,
    pub timezone: Tz,
}

impl Location {
    /// Creates a validated location (elevation defaults to 0).
    ///
    /// Returns `Err(MiqatError::InvalidInput)` if coordinates are out of range.
    pub fn new(lat: f64, lng: f64, timezone: Tz) -> Result<Self, MiqatError> {
        let location = Self::new_unchecked(lat, lng, timezone);
        location.validate()?;
        Ok(location)
    }

    /// Creates a location without validation. Use with trusted inputs only.
    #[inline]
    pub const fn new_unchecked(lat: f64, lng: f64, timezone: Tz) -> Self {
        Self { lat, lng, elevation: 0.0, timezone }
    }

    /// Sets the elevation (meters above sea level).
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// Checks the coordinate pair and elevation.
    pub fn validate(&self) -> Result<(), MiqatError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(MiqatError::invalid_input(format!(
                "Latitude {} out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(MiqatError::invalid_input(format!(
                "Longitude {} out of range [-180, 180]",
                self.lng
            )));
        }
        if !self.elevation.is_finite() || self.elevation < -500.0 || self.elevation > 9000.0 {
            return Err(MiqatError::invalid_input(format!(
                "Elevation {} m out of range [-500, 9000]",
                self.elevation
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Location::new(91.0, 0.0, Tz::UTC).is_err());
        assert!(Location::new(0.0, -180.5, Tz::UTC).is_err());
        assert!(Location::new(f64::NAN, 0.0, Tz::UTC).is_err());
        assert!(Location::new(33.9114, -84.2614, Tz::America__New_York).is_ok());
    }

    #[test]
    fn test_elevation_validation() {
        let loc = Location::new_unchecked(21.4, 39.8, Tz::Asia__Riyadh).with_elevation(20_000.0);
        assert!(loc.validate().unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_serde_uses_timezone_name() {
        let loc = Location::new(-6.2088, 106.8456, Tz::Asia__Jakarta).unwrap();
        let json = serde_json::to_string(&loc).unwrap();
        assert!(json.contains("Asia/Jakarta"));
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
