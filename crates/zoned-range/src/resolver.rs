//! Civil date-time ⇄ instant resolution for named timezones.
//!
//! The forward direction (instant → wall clock) is a single oracle call. The
//! reverse direction has no closed form once DST is involved, so
//! [`TimezoneResolver::civil_to_instant`] searches for it: it seeds a window
//! of ±24 hours around the civil time read as if it were UTC, bisects on the
//! wall-clock reading of the midpoint, and then checks every offset seen in
//! the window to classify the civil time as unique, ambiguous (fall-back
//! overlap) or nonexistent (spring-forward gap). [`DstPolicy`] decides the
//! last two cases.
//!
//! All functions take explicit inputs and never read the system clock.

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat};
use serde::Serialize;

use crate::civil::{CivilDate, CivilDateTime, CivilTimeOfDay, DateTimeRange, Instant};
use crate::dst::{DstPolicy, GapPolicy, OverlapPolicy};
use crate::error::{RangeError, Result};
use crate::oracle::{OffsetOracle, TzdbOracle};

/// Half-width of the search window. No real-world zone moves its offset by
/// more than a day within a 48-hour span.
const SEARCH_RADIUS_MS: i64 = 24 * 60 * 60 * 1_000;

/// Bisection ceiling. 28 halvings already reach 1 ms over 48 hours.
const MAX_ITERATIONS: u32 = 48;

// ── LocalResolution ─────────────────────────────────────────────────────────

/// How a civil time maps onto the timeline of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocalResolution {
    /// Exactly one instant reads as the civil time.
    Unique(Instant),
    /// The civil time occurs twice (fall-back overlap).
    Ambiguous { earlier: Instant, later: Instant },
    /// The civil time never occurs (spring-forward gap).
    ///
    /// `transition` is the first instant after the gap; `shifted` is the
    /// civil time read with the offset in effect before the gap.
    Gap {
        transition: Instant,
        shifted: Instant,
    },
}

impl LocalResolution {
    /// Pick a single instant according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::NonexistentLocalTime`] for a gap under
    /// [`GapPolicy::Reject`].
    pub fn select(self, policy: DstPolicy, civil: &CivilDateTime, tz: &str) -> Result<Instant> {
        match self {
            LocalResolution::Unique(instant) => Ok(instant),
            LocalResolution::Ambiguous { earlier, later } => Ok(match policy.overlap {
                OverlapPolicy::Earlier => earlier,
                OverlapPolicy::Later => later,
            }),
            LocalResolution::Gap {
                transition,
                shifted,
            } => match policy.gap {
                GapPolicy::SnapToTransition => Ok(transition),
                GapPolicy::ShiftForward => Ok(shifted),
                GapPolicy::Reject => Err(RangeError::NonexistentLocalTime(format!(
                    "{} does not occur in '{}'",
                    civil, tz
                ))),
            },
        }
    }
}

// ── ZonedInstant ────────────────────────────────────────────────────────────

/// Display data for an instant seen from a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZonedInstant {
    /// The instant in UTC (RFC 3339).
    pub utc: String,
    /// The instant on the zone's wall clock (RFC 3339 with offset).
    pub local: String,
    /// The timezone id used.
    pub timezone: String,
    /// The UTC offset at this instant (e.g., "-05:00").
    pub utc_offset: String,
    /// Whether Daylight Saving Time is active at this instant.
    pub dst_active: bool,
}

// ── TimezoneResolver ────────────────────────────────────────────────────────

/// Bidirectional civil ⇄ instant mapping over an injected [`OffsetOracle`].
///
/// Stateless apart from its configuration, so one resolver can be shared
/// freely across threads when the oracle allows it.
///
/// # Examples
///
/// ```
/// use zoned_range::{CivilDateTime, TimezoneResolver};
///
/// let resolver = TimezoneResolver::tzdb();
/// let civil = CivilDateTime::new(2024, 3, 15, 10, 0, 0).unwrap();
/// let instant = resolver.civil_to_instant(&civil, "America/New_York").unwrap();
/// // March 15 2024 is EDT (UTC-4), so 10:00 local = 14:00 UTC
/// assert_eq!(instant.to_string(), "2024-03-15T14:00:00.000Z");
/// assert_eq!(resolver.instant_to_civil(instant, "America/New_York").unwrap(), civil);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimezoneResolver<O = TzdbOracle> {
    oracle: O,
    policy: DstPolicy,
}

struct Bisection {
    /// A midpoint whose wall-clock reading matched the target exactly.
    hit: Option<Instant>,
    /// First instant whose reading is not earlier than the target.
    boundary: Instant,
    iterations: u32,
}

impl TimezoneResolver {
    /// A resolver backed by the IANA database compiled into `chrono-tz`.
    pub fn tzdb() -> Self {
        TimezoneResolver::new(TzdbOracle)
    }
}

impl<O: OffsetOracle> TimezoneResolver<O> {
    pub fn new(oracle: O) -> Self {
        TimezoneResolver {
            oracle,
            policy: DstPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DstPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DstPolicy {
        self.policy
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The UTC offset in effect for `tz` at `instant`, in minutes east of UTC.
    ///
    /// Historical offsets with a seconds component are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimezone`] if the oracle does not know `tz`.
    pub fn offset_minutes(&self, instant: Instant, tz: &str) -> Result<i32> {
        Ok(self.oracle.offset_seconds(instant, tz)? / 60)
    }

    /// The wall-clock reading of `instant` in `tz`. Exact and total.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimezone`] if the oracle does not know `tz`.
    pub fn instant_to_civil(&self, instant: Instant, tz: &str) -> Result<CivilDateTime> {
        self.oracle.format(instant, tz)
    }

    /// The instant whose wall-clock reading in `tz` is `civil`.
    ///
    /// Gaps and overlaps are settled by the resolver's [`DstPolicy`]: by
    /// default a civil time inside a spring-forward gap snaps to the
    /// transition instant, and a civil time inside a fall-back overlap
    /// resolves to its earlier occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidCivilDateTime`] for malformed fields
    /// (checked before any oracle call), [`RangeError::UnknownTimezone`] if
    /// the oracle does not know `tz`, and
    /// [`RangeError::NonexistentLocalTime`] for a gap under
    /// [`GapPolicy::Reject`].
    pub fn civil_to_instant(&self, civil: &CivilDateTime, tz: &str) -> Result<Instant> {
        self.resolve_candidates(civil, tz)?
            .select(self.policy, civil, tz)
    }

    /// Classify how `civil` maps onto the timeline of `tz`.
    ///
    /// # Errors
    ///
    /// Same as [`civil_to_instant`](Self::civil_to_instant), minus the gap
    /// rejection.
    pub fn resolve_candidates(&self, civil: &CivilDateTime, tz: &str) -> Result<LocalResolution> {
        let naive_seconds = civil.naive_unix_seconds()?;
        let naive = Instant::from_unix_seconds(naive_seconds)
            .ok_or_else(|| RangeError::InvalidCivilDateTime(civil.to_string()))?;

        let search = self.bisect(civil, naive, tz)?;
        tracing::trace!(
            %civil,
            tz,
            iterations = search.iterations,
            exact = search.hit.is_some(),
            "bisection finished"
        );

        // Every occurrence of `civil` is `naive - offset` for some offset in
        // effect near it, so probing the offsets seen at the window edges
        // and at the bisection result finds all of them.
        let (low_edge, high_edge) = search_window(naive);
        let mut offsets = vec![
            self.oracle.offset_seconds(low_edge, tz)?,
            self.oracle.offset_seconds(high_edge, tz)?,
            self.oracle.offset_seconds(search.boundary, tz)?,
        ];
        if let Some(hit) = search.hit {
            offsets.push(self.oracle.offset_seconds(hit, tz)?);
        }
        offsets.sort_unstable();
        offsets.dedup();

        let mut occurrences = Vec::with_capacity(2);
        let mut out_of_range = None;
        for offset in offsets {
            let seconds = naive_seconds - i64::from(offset);
            match Instant::from_unix_seconds(seconds) {
                Some(candidate) if candidate.clamp_to_representable() == candidate => {
                    if self.oracle.format(candidate, tz)? == *civil {
                        occurrences.push(candidate);
                    }
                }
                _ => out_of_range = Some(seconds.saturating_mul(1_000)),
            }
        }
        occurrences.sort_unstable();
        occurrences.dedup();

        match occurrences.as_slice() {
            [only] => Ok(LocalResolution::Unique(*only)),
            [earlier, .., later] => {
                tracing::debug!(%civil, tz, %earlier, %later, "civil time falls in a DST overlap");
                Ok(LocalResolution::Ambiguous {
                    earlier: *earlier,
                    later: *later,
                })
            }
            [] => {
                if let Some(millis) = out_of_range {
                    return Err(RangeError::InstantOutOfRange(millis));
                }
                let transition = search.boundary;
                let before = Instant::from_millis(transition.as_millis().saturating_sub(1));
                let offset_before = self.oracle.offset_seconds(before, tz)?;
                let shifted = Instant::from_unix_seconds(naive_seconds - i64::from(offset_before))
                    .unwrap_or(transition);
                tracing::debug!(%civil, tz, %transition, %shifted, "civil time falls in a DST gap");
                Ok(LocalResolution::Gap {
                    transition,
                    shifted,
                })
            }
        }
    }

    /// Lower-bound bisection over `naive ± SEARCH_RADIUS_MS` on the
    /// six-field comparison of each midpoint's wall-clock reading against
    /// `target`. Stops early on an exact match.
    fn bisect(&self, target: &CivilDateTime, naive: Instant, tz: &str) -> Result<Bisection> {
        let (low, high) = search_window(naive);
        let (mut lo, mut hi) = (low.as_millis(), high.as_millis());
        let mut iterations = 0;

        while lo < hi && iterations < MAX_ITERATIONS {
            iterations += 1;
            let mid = Instant::from_millis(lo + (hi - lo) / 2);
            match self.oracle.format(mid, tz)?.cmp(target) {
                std::cmp::Ordering::Equal => {
                    return Ok(Bisection {
                        hit: Some(mid),
                        boundary: mid,
                        iterations,
                    });
                }
                std::cmp::Ordering::Less => lo = mid.as_millis() + 1,
                std::cmp::Ordering::Greater => hi = mid.as_millis(),
            }
        }

        let boundary = Instant::from_millis(hi);
        let hit = (self.oracle.format(boundary, tz)? == *target).then_some(boundary);
        Ok(Bisection {
            hit,
            boundary,
            iterations,
        })
    }

    /// Resolve a picker input: a calendar day, a time-of-day string such as
    /// `"14:30"` or `"2:30pm"`, and a zone id.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidTimeOfDay`] if `time` does not parse,
    /// otherwise the errors of [`civil_to_instant`](Self::civil_to_instant).
    pub fn resolve_input(&self, date: CivilDate, time: &str, tz: &str) -> Result<Instant> {
        let time: CivilTimeOfDay = time.parse()?;
        self.civil_to_instant(&CivilDateTime::from_date_time(date, time), tz)
    }

    /// Resolve an optional start and end in the same zone. Absent ends stay
    /// absent; ordering is left to the validator.
    pub fn resolve_range(
        &self,
        start: Option<&CivilDateTime>,
        end: Option<&CivilDateTime>,
        tz: &str,
    ) -> Result<DateTimeRange> {
        Ok(DateTimeRange {
            start: start.map(|c| self.civil_to_instant(c, tz)).transpose()?,
            end: end.map(|c| self.civil_to_instant(c, tz)).transpose()?,
        })
    }

    /// Describe `instant` as seen from `tz`.
    ///
    /// DST is reported active when the zone's offset differs between
    /// January 1 and July 1 of the instant's year and the current offset is
    /// the larger of the two.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::UnknownTimezone`] if the oracle does not know
    /// `tz`, or [`RangeError::InstantOutOfRange`] if the instant cannot be
    /// formatted.
    pub fn describe(&self, instant: Instant, tz: &str) -> Result<ZonedInstant> {
        let utc = instant.to_datetime()?;
        let offset_seconds = self.oracle.offset_seconds(instant, tz)?;
        let offset = FixedOffset::east_opt(offset_seconds)
            .ok_or(RangeError::InstantOutOfRange(instant.as_millis()))?;
        let local: DateTime<FixedOffset> = utc.with_timezone(&offset);

        let dst_active = self.is_dst_active(offset_seconds, utc.year(), tz)?;

        Ok(ZonedInstant {
            utc: utc.to_rfc3339_opts(SecondsFormat::Secs, true),
            local: local.to_rfc3339_opts(SecondsFormat::Secs, false),
            timezone: tz.to_string(),
            utc_offset: format_utc_offset(offset_seconds),
            dst_active,
        })
    }

    fn is_dst_active(&self, current: i32, year: i32, tz: &str) -> Result<bool> {
        let offset_on = |month| -> Result<i32> {
            let civil = CivilDateTime::new(year, month, 1, 12, 0, 0)?;
            let at = Instant::from_unix_seconds(civil.naive_unix_seconds()?)
                .ok_or_else(|| RangeError::InvalidCivilDateTime(civil.to_string()))?;
            self.oracle.offset_seconds(at, tz)
        };
        let january = offset_on(1)?;
        let july = offset_on(7)?;
        Ok(january != july && current == january.max(july))
    }
}

/// The bisection window around `naive`, clamped to what chrono can represent.
fn search_window(naive: Instant) -> (Instant, Instant) {
    let millis = naive.as_millis();
    (
        Instant::from_millis(millis.saturating_sub(SEARCH_RADIUS_MS)).clamp_to_representable(),
        Instant::from_millis(millis.saturating_add(SEARCH_RADIUS_MS)).clamp_to_representable(),
    )
}

/// Format a UTC offset in seconds as a string (e.g., "-05:00", "+05:30").
fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

// ── Tests ───────────────────────────────────────────────────────────────────
