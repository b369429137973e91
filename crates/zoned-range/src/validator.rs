//! Range validation against a [`ConstraintConfig`].
//!
//! [`RangeValidator::validate`] reports at most one violation. Rules are
//! checked in a fixed order and the first failure wins, so a user always
//! sees the same message for the same input:
//!
//! 1. `MinDate`: start before the minimum instant
//! 2. `MaxDate`: end after the maximum instant
//! 3. `Blackout`: any calendar day from start's day to end's day is blacked out
//! 4. `InvalidRange`: start not strictly before end
//! 5. `MinDuration`: shorter than the minimum
//! 6. `MaxDuration`: longer than the maximum
//! 7. `MinTime`: start's time of day before the minimum
//! 8. `MaxTime`: end's time of day after the maximum
//!
//! Calendar days and times of day are read off the instants through a
//! [`CivilProjection`]: UTC by default, or whatever zone the caller built the
//! range in. Blackout dates must be expressed in that same zone.

use std::fmt;

use chrono::Utc;
use serde::Serialize;

use crate::civil::{CivilDate, CivilProjection, DateTimeRange, Instant};
use crate::constraints::ConstraintConfig;

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorKind {
    MinDate,
    MaxDate,
    MinTime,
    MaxTime,
    Blackout,
    MinDuration,
    MaxDuration,
    InvalidRange,
}

/// A violated rule plus a message for display.
///
/// Message wording is for humans and may change; match on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Stateless checker for [`DateTimeRange`]s.
#[derive(Debug, Clone, Copy)]
pub struct RangeValidator<P = Utc> {
    projection: P,
}

impl RangeValidator {
    /// A validator that reads calendar days and times of day in UTC.
    pub fn new() -> Self {
        RangeValidator { projection: Utc }
    }
}

impl Default for RangeValidator {
    fn default() -> Self {
        RangeValidator::new()
    }
}

impl<P: CivilProjection> RangeValidator<P> {
    /// A validator that reads calendar days and times of day through
    /// `projection`, e.g. a `chrono_tz::Tz`.
    pub fn with_projection(projection: P) -> Self {
        RangeValidator { projection }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// The first rule `range` violates, or `None`.
    ///
    /// A range missing either end is incomplete, not invalid, and always
    /// passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use zoned_range::{ConstraintConfig, DateTimeRange, Instant, RangeValidator, ValidationErrorKind};
    ///
    /// let start = Instant::parse_rfc3339("2024-03-15T10:00:00Z").unwrap();
    /// let end = Instant::parse_rfc3339("2024-03-15T10:30:00Z").unwrap();
    /// let constraints = ConstraintConfig::new().with_min_duration_minutes(60);
    ///
    /// let error = RangeValidator::new()
    ///     .validate(&DateTimeRange::new(start, end), &constraints)
    ///     .unwrap();
    /// assert_eq!(error.kind, ValidationErrorKind::MinDuration);
    /// ```
    pub fn validate(
        &self,
        range: &DateTimeRange,
        constraints: &ConstraintConfig,
    ) -> Option<ValidationError> {
        let (Some(start), Some(end)) = (range.start, range.end) else {
            return None;
        };
        let violation = self.first_violation(start, end, constraints);
        if let Some(error) = &violation {
            tracing::debug!(kind = ?error.kind, %start, %end, "range rejected");
        }
        violation
    }

    fn first_violation(
        &self,
        start: Instant,
        end: Instant,
        c: &ConstraintConfig,
    ) -> Option<ValidationError> {
        use ValidationErrorKind::*;

        if let Some(min) = c.min_instant {
            if start < min {
                return Some(ValidationError::new(
                    MinDate,
                    format!("Start must be on or after {min}"),
                ));
            }
        }

        if let Some(max) = c.max_instant {
            if end > max {
                return Some(ValidationError::new(
                    MaxDate,
                    format!("End must be on or before {max}"),
                ));
            }
        }

        if let Some(error) = self.check_blackout(start, end, c) {
            return Some(error);
        }

        if start >= end {
            let message = "End must be after start";
            return Some(ValidationError::new(InvalidRange, message));
        }

        let elapsed = start.millis_until(end);

        if let Some(min) = c.min_duration_minutes {
            if elapsed < i64::from(min) * MILLIS_PER_MINUTE {
                return Some(ValidationError::new(
                    MinDuration,
                    format!("Range must be at least {min} minutes"),
                ));
            }
        }

        if let Some(max) = c.max_duration_minutes {
            if elapsed > i64::from(max) * MILLIS_PER_MINUTE {
                return Some(ValidationError::new(
                    MaxDuration,
                    format!("Range must be at most {max} minutes"),
                ));
            }
        }

        if let Some(min) = c.min_time_of_day {
            if self.projection.to_civil(start).time_of_day() < min {
                return Some(ValidationError::new(
                    MinTime,
                    format!("Start time must be at or after {min}"),
                ));
            }
        }

        if let Some(max) = c.max_time_of_day {
            if self.projection.to_civil(end).time_of_day() > max {
                return Some(ValidationError::new(
                    MaxTime,
                    format!("End time must be at or before {max}"),
                ));
            }
        }

        None
    }

    /// Earliest blacked-out day between start's day and end's day. For an
    /// inverted range only the two endpoint days are checked.
    fn check_blackout(
        &self,
        start: Instant,
        end: Instant,
        c: &ConstraintConfig,
    ) -> Option<ValidationError> {
        if c.blackout_dates.is_empty() {
            return None;
        }
        let start_day = self.projection.to_civil(start).date();
        let end_day = self.projection.to_civil(end).date();

        let hit = if start_day <= end_day {
            c.blackout_dates.range(start_day..=end_day).next().copied()
        } else {
            [start_day, end_day]
                .into_iter()
                .find(|day| c.is_blackout(day))
        };
        let hit = hit?;

        let message = if hit == start_day {
            format!("Start date {hit} is unavailable")
        } else if hit == end_day {
            format!("End date {hit} is unavailable")
        } else {
            format!("Range includes unavailable date {hit}")
        };
        Some(ValidationError::new(ValidationErrorKind::Blackout, message))
    }

    /// Whether a calendar cell should be disabled.
    ///
    /// Compared by calendar day: the days containing `min_instant` and
    /// `max_instant` stay enabled. Duration and time-of-day rules only apply
    /// to whole ranges and are ignored here.
    pub fn is_date_disabled(&self, date: &CivilDate, constraints: &ConstraintConfig) -> bool {
        if let Some(min) = constraints.min_instant {
            if *date < self.projection.to_civil(min).date() {
                return true;
            }
        }
        if let Some(max) = constraints.max_instant {
            if *date > self.projection.to_civil(max).date() {
                return true;
            }
        }
        constraints.is_blackout(date)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
