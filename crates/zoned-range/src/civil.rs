//! Shared vocabulary between the engine and its callers.
//!
//! Absolute time is an [`Instant`] (milliseconds since the Unix epoch).
//! Wall-clock time is a [`CivilDateTime`], [`CivilDate`] or
//! [`CivilTimeOfDay`]; none of these carry a timezone, so they only mean
//! something next to the zone they were read in.
//!
//! Months are 1-based throughout (1 = January). Civil values have second
//! precision; projecting an instant onto the wall clock floors away the
//! milliseconds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RangeError, Result};

const MILLIS_PER_SECOND: i64 = 1_000;

// ── Instant ─────────────────────────────────────────────────────────────────

/// An absolute point in time: signed milliseconds since 1970-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(i64);

impl Instant {
    pub const UNIX_EPOCH: Instant = Instant(0);

    pub const fn from_millis(millis: i64) -> Self {
        Instant(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch, rounded toward negative infinity.
    pub const fn as_unix_seconds(self) -> i64 {
        self.0.div_euclid(MILLIS_PER_SECOND)
    }

    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        seconds.checked_mul(MILLIS_PER_SECOND).map(Instant)
    }

    pub fn from_datetime<Z: TimeZone>(dt: &DateTime<Z>) -> Self {
        Instant(dt.timestamp_millis())
    }

    /// Convert to a chrono UTC datetime.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InstantOutOfRange`] if chrono cannot represent
    /// the instant.
    pub fn to_datetime(self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0).ok_or(RangeError::InstantOutOfRange(self.0))
    }

    /// Like [`to_datetime`](Self::to_datetime), clamping to chrono's
    /// representable range instead of failing.
    pub(crate) fn to_datetime_clamped(self) -> DateTime<Utc> {
        let bound = if self.0 < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        };
        DateTime::from_timestamp_millis(self.0).unwrap_or(bound)
    }

    /// The nearest instant chrono can represent.
    pub(crate) fn clamp_to_representable(self) -> Instant {
        Instant::from_datetime(&self.to_datetime_clamped())
    }

    /// Parse an RFC 3339 string (any offset) into an instant.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidDatetime`] if the string cannot be parsed.
    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Instant::from_datetime(&dt))
            .map_err(|e| RangeError::InvalidDatetime(format!("'{}': {}", s, e)))
    }

    /// Milliseconds from `self` to `later`, saturating. Negative when `later`
    /// precedes `self`.
    pub fn millis_until(self, later: Instant) -> i64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Ok(dt) => f.write_str(&dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(dt: DateTime<Utc>) -> Self {
        Instant::from_datetime(&dt)
    }
}

// ── CivilDate ───────────────────────────────────────────────────────────────

/// A timezone-less calendar day in the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CivilDate {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub day: u32,
}

impl CivilDate {
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidCivilDateTime`] if the month is outside
    /// 1–12 or the day does not exist in that month.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        let date = CivilDate { year, month, day };
        date.to_naive()?;
        Ok(date)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        CivilDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn to_naive(&self) -> Result<NaiveDate> {
        if !(1..=12).contains(&self.month) {
            return Err(RangeError::InvalidCivilDateTime(format!(
                "month {} out of range 1-12",
                self.month
            )));
        }
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            RangeError::InvalidCivilDateTime(format!(
                "day {} out of range for {:04}-{:02}",
                self.day, self.year, self.month
            ))
        })
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CivilDate {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(CivilDate::from_naive)
            .map_err(|e| RangeError::InvalidCivilDateTime(format!("'{}': {}", s, e)))
    }
}

impl TryFrom<String> for CivilDate {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CivilDate> for String {
    fn from(date: CivilDate) -> Self {
        date.to_string()
    }
}

// ── CivilTimeOfDay ──────────────────────────────────────────────────────────

/// A wall-clock time of day, `00:00:00` through `23:59:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CivilTimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CivilTimeOfDay {
    pub const MIDNIGHT: CivilTimeOfDay = CivilTimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// # Errors
    ///
    /// Returns [`RangeError::InvalidTimeOfDay`] if any field is out of range.
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(|_| CivilTimeOfDay {
                hour,
                minute,
                second,
            })
            .ok_or_else(|| {
                RangeError::InvalidTimeOfDay(format!("{hour:02}:{minute:02}:{second:02}"))
            })
    }

    pub fn to_naive(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).ok_or_else(|| {
            RangeError::InvalidTimeOfDay(format!(
                "{:02}:{:02}:{:02}",
                self.hour, self.minute, self.second
            ))
        })
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        CivilTimeOfDay {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

impl fmt::Display for CivilTimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for CivilTimeOfDay {
    type Err = RangeError;

    /// Accepts `"14:00"`, `"14:30:15"`, `"2pm"`, `"2:30pm"`, `"2:30:15 PM"`.
    fn from_str(s: &str) -> Result<Self> {
        parse_time_string(s)
            .map(CivilTimeOfDay::from_naive)
            .ok_or_else(|| RangeError::InvalidTimeOfDay(format!("'{}'", s.trim())))
    }
}

impl TryFrom<String> for CivilTimeOfDay {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CivilTimeOfDay> for String {
    fn from(time: CivilTimeOfDay) -> Self {
        time.to_string()
    }
}

/// Parse a 24-hour or 12-hour time string.
fn parse_time_string(s: &str) -> Option<NaiveTime> {
    let s = s.trim().to_ascii_lowercase();

    // 24-hour format: "14:00", "14:30:00"
    if let Ok(t) = NaiveTime::parse_from_str(&s, "%H:%M:%S") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(&s, "%H:%M") {
        return Some(t);
    }

    // 12-hour format: "2pm", "2:30pm", "2:30:00pm", "2 pm"
    let s_no_space = s.replace(' ', "");
    let (time_part, is_pm) = if let Some(t) = s_no_space.strip_suffix("pm") {
        (t, true)
    } else if let Some(t) = s_no_space.strip_suffix("am") {
        (t, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = time_part.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let hour: u32 = parts.first()?.parse().ok()?;
    let minute: u32 = match parts.get(1) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.get(2) {
        Some(sec) => sec.parse().ok()?,
        None => 0,
    };

    let hour24 = match (hour, is_pm) {
        (h, _) if h == 0 || h > 12 => return None,
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };

    NaiveTime::from_hms_opt(hour24, minute, second)
}

// ── CivilDateTime ───────────────────────────────────────────────────────────

/// A wall-clock date-time with no zone attached.
///
/// Fields are public so callers can assemble values from form inputs; call
/// [`validate`](Self::validate) (the resolver always does) before trusting
/// them. The derived ordering is lexicographic over
/// (year, month, day, hour, minute, second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CivilDateTime {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CivilDateTime {
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidCivilDateTime`] if any field is out of range.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        let civil = CivilDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        civil.validate()?;
        Ok(civil)
    }

    pub fn from_date_time(date: CivilDate, time: CivilTimeOfDay) -> Self {
        CivilDateTime {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: time.hour,
            minute: time.minute,
            second: time.second,
        }
    }

    /// Check every field against the proleptic Gregorian calendar and a
    /// 24-hour clock without leap seconds.
    pub fn validate(&self) -> Result<()> {
        self.to_naive().map(|_| ())
    }

    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        let date = self.date().to_naive()?;
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return Err(RangeError::InvalidCivilDateTime(format!(
                "time {:02}:{:02}:{:02} out of range",
                self.hour, self.minute, self.second
            )));
        }
        date.and_hms_opt(self.hour, self.minute, self.second)
            .ok_or_else(|| RangeError::InvalidCivilDateTime(self.to_string()))
    }

    pub fn from_naive(naive: &NaiveDateTime) -> Self {
        CivilDateTime {
            year: naive.year(),
            month: naive.month(),
            day: naive.day(),
            hour: naive.hour(),
            minute: naive.minute(),
            second: naive.second(),
        }
    }

    pub fn date(&self) -> CivilDate {
        CivilDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    pub fn time_of_day(&self) -> CivilTimeOfDay {
        CivilTimeOfDay {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    /// Seconds since the epoch if this wall-clock reading were UTC.
    pub(crate) fn naive_unix_seconds(&self) -> Result<i64> {
        Ok(self.to_naive()?.and_utc().timestamp())
    }
}

impl fmt::Display for CivilDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// ── DateTimeRange ───────────────────────────────────────────────────────────

/// A possibly incomplete start/end selection.
///
/// No ordering is enforced here; an inverted range is a validation outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeRange {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
}

impl DateTimeRange {
    pub fn new(start: Instant, end: Instant) -> Self {
        DateTimeRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn empty() -> Self {
        DateTimeRange::default()
    }

    pub fn with_start(self, start: Instant) -> Self {
        DateTimeRange {
            start: Some(start),
            ..self
        }
    }

    pub fn with_end(self, end: Instant) -> Self {
        DateTimeRange {
            end: Some(end),
            ..self
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Swap start and end when both are present and inverted.
    ///
    /// For pickers that auto-swap on selection; the validator never calls it.
    pub fn normalized(self) -> Self {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => DateTimeRange::new(end, start),
            _ => self,
        }
    }
}

// ── CivilProjection ─────────────────────────────────────────────────────────

/// A zone view that reads the wall clock off an instant.
///
/// The validator uses it to find calendar days and times of day. Any chrono
/// [`TimeZone`] works: `Utc`, `FixedOffset`, or a `chrono_tz::Tz`. Instants
/// beyond chrono's range are clamped to its first or last representable
/// moment.
pub trait CivilProjection {
    fn to_civil(&self, instant: Instant) -> CivilDateTime;
}

impl<Z: TimeZone> CivilProjection for Z {
    fn to_civil(&self, instant: Instant) -> CivilDateTime {
        let local = instant.to_datetime_clamped().with_timezone(self);
        CivilDateTime::from_naive(&local.naive_local())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    // ── Instant tests ───────────────────────────────────────────────────

    #[test]
    fn test_instant_parse_rfc3339_with_offset() {
        let a = Instant::parse_rfc3339("2024-03-15T10:00:00Z").unwrap();
        let b = Instant::parse_rfc3339("2024-03-15T06:00:00-04:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_millis(), 1_710_496_800_000);
    }

    #[test]
    fn test_instant_parse_rfc3339_invalid() {
        let err = Instant::parse_rfc3339("not-a-datetime").unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"), "got: {err}");
    }

    #[test]
    fn test_instant_display_is_rfc3339_utc() {
        let i = Instant::parse_rfc3339("2024-03-15T10:00:00.250+01:00").unwrap();
        assert_eq!(i.to_string(), "2024-03-15T09:00:00.250Z");
    }

    #[test]
    fn test_instant_unix_seconds_floor_negative() {
        assert_eq!(Instant::from_millis(-1).as_unix_seconds(), -1);
        assert_eq!(Instant::from_millis(1_999).as_unix_seconds(), 1);
    }

    #[test]
    fn test_instant_millis_until() {
        let start = Instant::parse_rfc3339("2024-03-15T10:00:00Z").unwrap();
        let end = Instant::parse_rfc3339("2024-03-15T10:30:59.500Z").unwrap();
        assert_eq!(start.millis_until(end), 1_859_500);
        assert_eq!(end.millis_until(start), -1_859_500);
        let far = Instant::from_millis(i64::MIN).millis_until(Instant::from_millis(i64::MAX));
        assert_eq!(far, i64::MAX);
    }

    #[test]
    fn test_instant_clamp_to_representable() {
        let at = Instant::parse_rfc3339("2024-03-15T10:00:00.123Z").unwrap();
        assert_eq!(at.clamp_to_representable(), at);
        let max = Instant::from_datetime(&DateTime::<Utc>::MAX_UTC);
        let min = Instant::from_datetime(&DateTime::<Utc>::MIN_UTC);
        assert_eq!(Instant::from_millis(i64::MAX).clamp_to_representable(), max);
        assert_eq!(Instant::from_millis(i64::MIN).clamp_to_representable(), min);
        assert!(max.to_datetime().is_ok());
    }

    #[test]
    fn test_instant_to_datetime_out_of_range() {
        let err = Instant::from_millis(i64::MAX).to_datetime().unwrap_err();
        assert_eq!(err, RangeError::InstantOutOfRange(i64::MAX));
    }

    // ── CivilDate tests ─────────────────────────────────────────────────

    #[test]
    fn test_civil_date_rejects_bad_fields() {
        assert!(CivilDate::new(2024, 2, 29).is_ok());
        assert!(CivilDate::new(2023, 2, 29).is_err());
        assert!(CivilDate::new(2024, 0, 1).is_err());
        assert!(CivilDate::new(2024, 13, 1).is_err());
    }

    #[test]
    fn test_civil_date_parse_and_display() {
        let d: CivilDate = "2024-03-15".parse().unwrap();
        assert_eq!(d, CivilDate::new(2024, 3, 15).unwrap());
        assert_eq!(d.to_string(), "2024-03-15");
        assert!("2024-02-30".parse::<CivilDate>().is_err());
    }

    #[test]
    fn test_civil_date_serde_as_string() {
        let d = CivilDate::new(2024, 3, 5).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-03-05\"");
        let back: CivilDate = serde_json::from_str("\"2024-03-05\"").unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<CivilDate>("\"2024-13-05\"").is_err());
    }

    // ── CivilTimeOfDay tests ────────────────────────────────────────────

    #[test]
    fn test_time_of_day_24_hour() {
        let t: CivilTimeOfDay = "14:30".parse().unwrap();
        assert_eq!(t, CivilTimeOfDay::new(14, 30, 0).unwrap());
        let t: CivilTimeOfDay = "09:05:07".parse().unwrap();
        assert_eq!(t.to_string(), "09:05:07");
    }

    #[test]
    fn test_time_of_day_12_hour() {
        assert_eq!(
            "2pm".parse::<CivilTimeOfDay>().unwrap(),
            CivilTimeOfDay::new(14, 0, 0).unwrap()
        );
        assert_eq!(
            "2:30 PM".parse::<CivilTimeOfDay>().unwrap(),
            CivilTimeOfDay::new(14, 30, 0).unwrap()
        );
        assert_eq!(
            "12am".parse::<CivilTimeOfDay>().unwrap(),
            CivilTimeOfDay::MIDNIGHT
        );
        assert_eq!(
            "12pm".parse::<CivilTimeOfDay>().unwrap(),
            CivilTimeOfDay::new(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_time_of_day_rejects_garbage() {
        for bad in ["", "25:00", "13pm", "0am", "noonish", "10:61", "1:2:3:4pm"] {
            let err = bad.parse::<CivilTimeOfDay>().unwrap_err();
            assert!(
                err.to_string().contains("Invalid time of day"),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_time_of_day_ordering() {
        let early: CivilTimeOfDay = "08:59:59".parse().unwrap();
        let late: CivilTimeOfDay = "09:00".parse().unwrap();
        assert!(early < late);
    }

    // ── CivilDateTime tests ─────────────────────────────────────────────

    #[test]
    fn test_civil_datetime_validate() {
        assert!(CivilDateTime::new(2024, 3, 10, 2, 30, 0).is_ok());
        let mut c = CivilDateTime::new(2024, 3, 10, 2, 30, 0).unwrap();
        c.hour = 24;
        assert!(c.validate().is_err());
        c.hour = 23;
        c.second = 60;
        assert!(c.validate().is_err());
        c.second = 0;
        c.day = 32;
        let err = c.validate().unwrap_err();
        assert!(
            err.to_string().contains("Invalid civil date-time"),
            "got: {err}"
        );
    }

    #[test]
    fn test_civil_datetime_lexicographic_order() {
        let a = CivilDateTime::new(2024, 3, 10, 23, 59, 59).unwrap();
        let b = CivilDateTime::new(2024, 3, 11, 0, 0, 0).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_civil_datetime_parts() {
        let c = CivilDateTime::new(2024, 3, 15, 10, 20, 30).unwrap();
        assert_eq!(c.date(), CivilDate::new(2024, 3, 15).unwrap());
        assert_eq!(c.time_of_day(), CivilTimeOfDay::new(10, 20, 30).unwrap());
        assert_eq!(c.to_string(), "2024-03-15T10:20:30");
        assert_eq!(CivilDateTime::from_date_time(c.date(), c.time_of_day()), c);
    }

    // ── DateTimeRange tests ─────────────────────────────────────────────

    #[test]
    fn test_range_normalized_swaps_inverted() {
        let a = Instant::from_millis(10);
        let b = Instant::from_millis(20);
        assert_eq!(
            DateTimeRange::new(b, a).normalized(),
            DateTimeRange::new(a, b)
        );
        assert_eq!(
            DateTimeRange::new(a, b).normalized(),
            DateTimeRange::new(a, b)
        );
        let partial = DateTimeRange::empty().with_end(a);
        assert_eq!(partial.normalized(), partial);
        assert!(!partial.is_complete());
    }

    // ── CivilProjection tests ───────────────────────────────────────────

    #[test]
    fn test_projection_utc_and_fixed_offset() {
        let i = Instant::parse_rfc3339("2024-03-15T02:30:00Z").unwrap();
        assert_eq!(
            Utc.to_civil(i),
            CivilDateTime::new(2024, 3, 15, 2, 30, 0).unwrap()
        );
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            west.to_civil(i),
            CivilDateTime::new(2024, 3, 14, 21, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_projection_clamps_out_of_range() {
        let far = Utc.to_civil(Instant::from_millis(i64::MAX));
        assert_eq!(
            far,
            CivilDateTime::from_naive(&DateTime::<Utc>::MAX_UTC.naive_utc())
        );
    }
}
