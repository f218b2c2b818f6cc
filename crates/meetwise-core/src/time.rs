//! Time types for availability computation.
//!
//! This module provides [`TimeInterval`], a validated half-open `[start, end)`
//! range in UTC, and [`DayWindow`], the midnight-to-midnight span of one
//! calendar day resolved in an explicitly supplied IANA timezone.
//!
//! All timestamps are stored in UTC. Timezone resolution happens once, when a
//! [`DayWindow`] is built; nothing in this crate reads the process-local zone.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for interval and duration inputs.
///
/// Both are detected before any computation proceeds. Malformed inputs are
/// surfaced to the caller, never silently corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    /// An interval whose end does not lie strictly after its start.
    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        /// The offending start bound.
        start: DateTime<Utc>,
        /// The offending end bound.
        end: DateTime<Utc>,
    },

    /// A slot duration that is not usable for the requested operation.
    #[error("invalid duration: {0}")]
    InvalidDuration(Duration),
}

/// Raw `{start, end}` bounds, used to validate intervals on deserialization.
#[derive(Debug, Deserialize)]
struct IntervalBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// An immutable half-open time range `[start, end)` in UTC.
///
/// The invariant `start < end` is enforced on construction; degenerate
/// (`start == end`) and inverted intervals are rejected with
/// [`SlotError::InvalidInterval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates a new interval, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SlotError> {
        if end <= start {
            return Err(SlotError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Internal constructor for bounds already known to be ordered.
    pub(crate) fn from_parts(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "interval bounds must be ordered");
        Self { start, end }
    }

    /// Start of the interval (inclusive).
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the interval (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval. Always positive.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks whether an instant falls within the interval.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Checks whether two intervals share any instant.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Restricts the interval to `window`, returning `None` when nothing of
    /// it remains inside.
    pub fn clip(&self, window: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        (start < end).then(|| Self::from_parts(start, end))
    }
}

impl TryFrom<IntervalBounds> for TimeInterval {
    type Error = SlotError;

    fn try_from(bounds: IntervalBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// The bounding span of one calendar day in a specific timezone.
///
/// Covers local midnight up to (but excluding) the next local midnight,
/// stored as UTC instants. On days with a DST transition the window is
/// shorter or longer than 24 hours; when local midnight itself is skipped by
/// a transition, the window starts at the first valid instant of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    date: NaiveDate,
    timezone: Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayWindow {
    /// Builds the window for `date` in `timezone`.
    pub fn for_date(date: NaiveDate, timezone: Tz) -> Self {
        let next = date.succ_opt().expect("valid successor date");
        let start = resolve_local(date.and_time(NaiveTime::MIN), timezone);
        let end = resolve_local(next.and_time(NaiveTime::MIN), timezone);
        Self {
            date,
            timezone,
            start,
            end,
        }
    }

    /// The calendar date this window covers.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The timezone the window was resolved in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Start of the day (inclusive), as a UTC instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the day (exclusive), as a UTC instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The window as a plain interval.
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::from_parts(self.start, self.end)
    }

    /// Length of the day. 24 hours except on DST transition days.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Resolves a naive local datetime in `tz` to a UTC instant.
///
/// Ambiguous local times (fall-back transition) resolve to the earlier
/// instant. Skipped local times (spring-forward gap) resolve to the first
/// valid instant after the gap.
pub(crate) fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let mut probe = naive;
            loop {
                probe += Duration::minutes(15);
                if let LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) =
                    tz.from_local_datetime(&probe)
                {
                    break dt.with_timezone(&Utc);
                }
            }
        }
    }
}
