//! Constraint sets for range validation.
//!
//! A [`ConstraintConfig`] is plain data: every rule is optional and an
//! absent rule is not enforced. Configs usually arrive from the caller's own
//! settings, so they deserialize from JSON with camelCase keys:
//!
//! ```
//! use zoned_range::ConstraintConfig;
//!
//! let config = ConstraintConfig::from_json(r#"{
//!     "minTimeOfDay": "09:00",
//!     "maxTimeOfDay": "5pm",
//!     "blackoutDates": ["2024-12-25"],
//!     "minDurationMinutes": 30
//! }"#).unwrap();
//! assert_eq!(config.min_duration_minutes, Some(30));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::civil::{CivilDate, CivilTimeOfDay, Instant};
use crate::error::{RangeError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintConfig {
    /// Earliest allowed start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_instant: Option<Instant>,
    /// Latest allowed end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_instant: Option<Instant>,
    /// Earliest allowed wall-clock time for the start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_time_of_day: Option<CivilTimeOfDay>,
    /// Latest allowed wall-clock time for the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_of_day: Option<CivilTimeOfDay>,
    /// Calendar days no selected range may touch.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub blackout_dates: BTreeSet<CivilDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<u32>,
}

impl ConstraintConfig {
    pub fn new() -> Self {
        ConstraintConfig::default()
    }

    /// Parse a config document.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Config`] if the JSON is malformed or a field
    /// does not parse (e.g. `"2024-02-30"` as a blackout date).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RangeError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RangeError::Config(e.to_string()))
    }

    pub fn with_min_instant(mut self, instant: Instant) -> Self {
        self.min_instant = Some(instant);
        self
    }

    pub fn with_max_instant(mut self, instant: Instant) -> Self {
        self.max_instant = Some(instant);
        self
    }

    pub fn with_min_time_of_day(mut self, time: CivilTimeOfDay) -> Self {
        self.min_time_of_day = Some(time);
        self
    }

    pub fn with_max_time_of_day(mut self, time: CivilTimeOfDay) -> Self {
        self.max_time_of_day = Some(time);
        self
    }

    pub fn with_blackout_date(mut self, date: CivilDate) -> Self {
        self.blackout_dates.insert(date);
        self
    }

    pub fn with_blackout_dates(mut self, dates: impl IntoIterator<Item = CivilDate>) -> Self {
        self.blackout_dates.extend(dates);
        self
    }

    pub fn with_min_duration_minutes(mut self, minutes: u32) -> Self {
        self.min_duration_minutes = Some(minutes);
        self
    }

    pub fn with_max_duration_minutes(mut self, minutes: u32) -> Self {
        self.max_duration_minutes = Some(minutes);
        self
    }

    pub fn is_blackout(&self, date: &CivilDate) -> bool {
        self.blackout_dates.contains(date)
    }

    /// Reject configurations no range could ever satisfy.
    ///
    /// Opt-in: [`RangeValidator::validate`](crate::RangeValidator::validate)
    /// does not call this, and with a contradictory duration pair it reports
    /// `MinDuration` or `MaxDuration` by its fixed rule order.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidConstraints`] when the minimum duration
    /// exceeds the maximum, or the minimum instant is after the maximum.
    pub fn check_consistency(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_duration_minutes, self.max_duration_minutes) {
            if min > max {
                return Err(RangeError::InvalidConstraints(format!(
                    "minimum duration {min} minutes exceeds maximum {max} minutes"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_instant, self.max_instant) {
            if min > max {
                return Err(RangeError::InvalidConstraints(format!(
                    "minimum date {min} is after maximum date {max}"
                )));
            }
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enforces_nothing() {
        let c = ConstraintConfig::default();
        assert!(c.min_instant.is_none());
        assert!(c.blackout_dates.is_empty());
        assert_eq!(c.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_from_json_full_document() {
        let c = ConstraintConfig::from_json(
            r#"{
                "minInstant": 1710460800000,
                "maxInstant": 1711929600000,
                "minTimeOfDay": "08:30",
                "maxTimeOfDay": "6:00 pm",
                "blackoutDates": ["2024-03-17", "2024-03-16"],
                "minDurationMinutes": 15,
                "maxDurationMinutes": 480
            }"#,
        )
        .unwrap();
        let hm = |h, m| CivilTimeOfDay::new(h, m, 0).unwrap();
        assert_eq!(c.min_instant, Some(Instant::from_millis(1_710_460_800_000)));
        assert_eq!(c.min_time_of_day, Some(hm(8, 30)));
        assert_eq!(c.max_time_of_day, Some(hm(18, 0)));
        assert!(c.is_blackout(&CivilDate::new(2024, 3, 16).unwrap()));
        assert!(!c.is_blackout(&CivilDate::new(2024, 3, 18).unwrap()));
        assert_eq!(c.max_duration_minutes, Some(480));
    }

    #[test]
    fn test_from_json_rejects_bad_fields() {
        for bad in [
            r#"{"blackoutDates": ["2024-02-30"]}"#,
            r#"{"minTimeOfDay": "25:00"}"#,
            r#"{"minDurationMinutes": -5}"#,
            r#"not json"#,
        ] {
            let err = ConstraintConfig::from_json(bad).unwrap_err();
            assert!(matches!(err, RangeError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_json_round_trip_via_builder() {
        let c = ConstraintConfig::new()
            .with_min_time_of_day(CivilTimeOfDay::new(9, 0, 0).unwrap())
            .with_blackout_dates([CivilDate::new(2024, 12, 25).unwrap()])
            .with_max_duration_minutes(60);
        let json = c.to_json().unwrap();
        assert!(json.contains(r#""minTimeOfDay":"09:00:00""#), "{json}");
        assert!(json.contains(r#""blackoutDates":["2024-12-25"]"#));
        assert_eq!(ConstraintConfig::from_json(&json).unwrap(), c);
    }

    #[test]
    fn test_check_consistency() {
        assert!(ConstraintConfig::new().check_consistency().is_ok());

        let contradictory = ConstraintConfig::new()
            .with_min_duration_minutes(120)
            .with_max_duration_minutes(60);
        let err = contradictory.check_consistency().unwrap_err();
        assert!(err.to_string().contains("Invalid constraints"), "{err}");

        let inverted = ConstraintConfig::new()
            .with_min_instant(Instant::from_millis(10))
            .with_max_instant(Instant::from_millis(5));
        assert!(inverted.check_consistency().is_err());

        let equal = ConstraintConfig::new()
            .with_min_duration_minutes(60)
            .with_max_duration_minutes(60);
        assert!(equal.check_consistency().is_ok());
    }
}
