//! The offset oracle: the engine's only source of timezone rules.
//!
//! The resolver never derives DST rules itself. It asks an [`OffsetOracle`]
//! how an instant reads on the wall clock of a named zone, and searches from
//! there. [`TzdbOracle`] answers from the IANA database compiled into
//! `chrono-tz`; [`FixedOffsetOracle`] answers from a table of constant
//! offsets and exists mostly for tests.

use std::collections::HashMap;

use chrono::{Duration, Offset};
use chrono_tz::Tz;

use crate::civil::{CivilDateTime, Instant};
use crate::error::{RangeError, Result};

/// Authoritative instant → wall-clock mapping for named zones.
///
/// Implementations must be deterministic: the same `(instant, tz)` always
/// yields the same answer. An id the oracle does not know is reported as
/// [`RangeError::UnknownTimezone`].
pub trait OffsetOracle {
    /// The wall-clock reading of `instant` in `tz`, milliseconds floored.
    fn format(&self, instant: Instant, tz: &str) -> Result<CivilDateTime>;

    /// Seconds east of UTC in effect for `tz` at `instant`.
    ///
    /// The default compares [`format`](Self::format) against the instant's
    /// own UTC reading.
    fn offset_seconds(&self, instant: Instant, tz: &str) -> Result<i32> {
        let local = self.format(instant, tz)?;
        let diff = local.naive_unix_seconds()? - instant.as_unix_seconds();
        i32::try_from(diff).map_err(|_| RangeError::InstantOutOfRange(instant.as_millis()))
    }

    /// Whether `tz` is a zone id this oracle can answer for.
    fn recognizes(&self, tz: &str) -> bool {
        self.format(Instant::UNIX_EPOCH, tz).is_ok()
    }
}

impl<O: OffsetOracle + ?Sized> OffsetOracle for &O {
    fn format(&self, instant: Instant, tz: &str) -> Result<CivilDateTime> {
        (**self).format(instant, tz)
    }

    fn offset_seconds(&self, instant: Instant, tz: &str) -> Result<i32> {
        (**self).offset_seconds(instant, tz)
    }

    fn recognizes(&self, tz: &str) -> bool {
        (**self).recognizes(tz)
    }
}

// ── TzdbOracle ──────────────────────────────────────────────────────────────

/// Oracle backed by the IANA timezone database shipped in `chrono-tz`.
///
/// Accepts any IANA name (`"America/New_York"`, `"Europe/Berlin"`) and the
/// literal `"UTC"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TzdbOracle;

impl TzdbOracle {
    pub fn new() -> Self {
        TzdbOracle
    }
}

impl OffsetOracle for TzdbOracle {
    fn format(&self, instant: Instant, tz: &str) -> Result<CivilDateTime> {
        let tz = parse_timezone(tz)?;
        let local = instant.to_datetime()?.with_timezone(&tz);
        Ok(CivilDateTime::from_naive(&local.naive_local()))
    }

    fn offset_seconds(&self, instant: Instant, tz: &str) -> Result<i32> {
        let tz = parse_timezone(tz)?;
        let local = instant.to_datetime()?.with_timezone(&tz);
        Ok(local.offset().fix().local_minus_utc())
    }

    fn recognizes(&self, tz: &str) -> bool {
        parse_timezone(tz).is_ok()
    }
}

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| RangeError::UnknownTimezone(format!("'{}'", s)))
}

// ── FixedOffsetOracle ───────────────────────────────────────────────────────

/// Oracle mapping zone ids to offsets that never change.
///
/// `"UTC"` is always registered at offset zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedOffsetOracle {
    zones: HashMap<String, i32>,
}

impl Default for FixedOffsetOracle {
    fn default() -> Self {
        FixedOffsetOracle::new()
    }
}

impl FixedOffsetOracle {
    pub fn new() -> Self {
        let mut zones = HashMap::new();
        zones.insert("UTC".to_string(), 0);
        FixedOffsetOracle { zones }
    }

    /// Register `name` at `offset_minutes` east of UTC (negative for west).
    pub fn with_zone(mut self, name: impl Into<String>, offset_minutes: i32) -> Self {
        self.zones.insert(name.into(), offset_minutes * 60);
        self
    }

    fn lookup(&self, tz: &str) -> Result<i32> {
        self.zones
            .get(tz)
            .copied()
            .ok_or_else(|| RangeError::UnknownTimezone(format!("'{}'", tz)))
    }
}

impl OffsetOracle for FixedOffsetOracle {
    fn format(&self, instant: Instant, tz: &str) -> Result<CivilDateTime> {
        let offset = self.lookup(tz)?;
        let local = instant
            .to_datetime()?
            .naive_utc()
            .checked_add_signed(Duration::seconds(i64::from(offset)))
            .ok_or(RangeError::InstantOutOfRange(instant.as_millis()))?;
        Ok(CivilDateTime::from_naive(&local))
    }

    fn offset_seconds(&self, _instant: Instant, tz: &str) -> Result<i32> {
        self.lookup(tz)
    }

    fn recognizes(&self, tz: &str) -> bool {
        self.zones.contains_key(tz)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
