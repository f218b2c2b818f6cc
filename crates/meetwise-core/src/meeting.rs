//! Meeting records and scheduling drafts.
//!
//! A [`MeetingDraft`] is caller input: a title plus optional `YYYY-MM-DD` /
//! `HH:MM` strings and an IANA timezone name. [`MeetingDraft::resolve`]
//! turns it into concrete UTC start/end instants; a [`Meeting`] is the
//! stored record with identity, status, and bookkeeping timestamps.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::resolve_local;

/// Timezone assumed when a draft or intent does not carry one.
pub const DEFAULT_TIMEZONE: &str = "America/Mexico_City";

/// Shortest accepted meeting, in minutes.
pub const MIN_DURATION_MIN: u32 = 5;

/// Longest accepted meeting, in minutes.
pub const MAX_DURATION_MIN: u32 = 480;

/// Errors producing a concrete schedule from a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeetingError {
    /// Date or time string that does not parse as `YYYY-MM-DD` / `HH:MM`.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Duration outside the accepted range.
    #[error("duration {0} min is out of range ({MIN_DURATION_MIN}..={MAX_DURATION_MIN})")]
    DurationOutOfRange(u32),

    /// Timezone name not present in the IANA database.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Lifecycle status of a meeting record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// The meeting exists and is scheduled.
    #[default]
    Created,
    /// The meeting was canceled; the record is kept.
    Canceled,
}

fn default_duration_min() -> u32 {
    30
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Caller input for creating a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDraft {
    /// Meeting title.
    pub title: String,

    /// Meeting date as `YYYY-MM-DD`, local to [`MeetingDraft::timezone`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Start time as `HH:MM` (24h), local to [`MeetingDraft::timezone`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Duration in minutes, `5..=480`.
    #[serde(default = "default_duration_min")]
    pub duration_min: u32,

    /// Attendee email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,

    /// Free-text agenda.
    #[serde(default)]
    pub agenda: String,

    /// IANA timezone name the date/time strings are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl MeetingDraft {
    /// Creates a draft with the default duration and timezone.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: None,
            start_time: None,
            duration_min: default_duration_min(),
            attendees: Vec::new(),
            agenda: String::new(),
            timezone: default_timezone(),
        }
    }

    /// Builder: set the date string (`YYYY-MM-DD`).
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Builder: set the start time string (`HH:MM`).
    pub fn with_start_time(mut self, time: impl Into<String>) -> Self {
        self.start_time = Some(time.into());
        self
    }

    /// Builder: set the duration in minutes.
    pub fn with_duration_min(mut self, minutes: u32) -> Self {
        self.duration_min = minutes;
        self
    }

    /// Builder: set the attendee list.
    pub fn with_attendees(mut self, attendees: Vec<String>) -> Self {
        self.attendees = attendees;
        self
    }

    /// Builder: set the agenda text.
    pub fn with_agenda(mut self, agenda: impl Into<String>) -> Self {
        self.agenda = agenda.into();
        self
    }

    /// Builder: set the timezone name.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Resolves the draft into concrete UTC start/end instants.
    ///
    /// When both date and start time are present they are interpreted in the
    /// draft's timezone; otherwise the meeting starts at `now` (truncated to
    /// whole seconds). The end is always `start + duration`.
    ///
    /// # Errors
    ///
    /// Fails when the duration is out of range, the timezone is unknown, or
    /// a present date/time string does not parse. Malformed input is
    /// surfaced, never silently corrected.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<Schedule, MeetingError> {
        if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&self.duration_min) {
            return Err(MeetingError::DurationOutOfRange(self.duration_min));
        }

        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|_| MeetingError::UnknownTimezone(self.timezone.clone()))?;

        let start = match (self.date.as_deref(), self.start_time.as_deref()) {
            (Some(date), Some(time)) => {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                    MeetingError::InvalidSchedule(format!("bad date {date:?}, use YYYY-MM-DD"))
                })?;
                let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
                    MeetingError::InvalidSchedule(format!("bad time {time:?}, use HH:MM"))
                })?;
                resolve_local(date.and_time(time), tz)
            }
            _ => now.with_nanosecond(0).unwrap_or(now),
        };

        Ok(Schedule {
            start,
            end: start + Duration::minutes(i64::from(self.duration_min)),
        })
    }
}

/// Concrete start/end instants resolved from a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// When the meeting starts.
    pub start: DateTime<Utc>,
    /// When the meeting ends.
    pub end: DateTime<Utc>,
}

/// A stored meeting record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Store-assigned identifier.
    pub id: String,
    /// Meeting title.
    pub title: String,
    /// Start instant in UTC.
    pub start: DateTime<Utc>,
    /// End instant in UTC.
    pub end: DateTime<Utc>,
    /// Duration in minutes.
    pub duration_min: u32,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
    /// Free-text agenda.
    pub agenda: String,
    /// IANA timezone the meeting was scheduled in.
    pub timezone: String,
    /// Lifecycle status.
    pub status: MeetingStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the meeting was canceled, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    /// Identifier of the mirrored calendar-provider event, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_event_id: Option<String>,
}

impl Meeting {
    /// Builds a meeting record from a resolved draft.
    pub fn from_draft(
        id: impl Into<String>,
        draft: &MeetingDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, MeetingError> {
        let schedule = draft.resolve(now)?;
        Ok(Self {
            id: id.into(),
            title: draft.title.clone(),
            start: schedule.start,
            end: schedule.end,
            duration_min: draft.duration_min,
            attendees: draft.attendees.clone(),
            agenda: draft.agenda.clone(),
            timezone: draft.timezone.clone(),
            status: MeetingStatus::Created,
            created_at: now,
            canceled_at: None,
            provider_event_id: None,
        })
    }

    /// Builder: attach the mirrored provider event id.
    pub fn with_provider_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.provider_event_id = Some(event_id.into());
        self
    }

    /// Marks the meeting canceled at the given instant.
    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.status = MeetingStatus::Canceled;
        self.canceled_at = Some(at);
    }

    /// Returns true if the meeting is canceled.
    pub fn is_canceled(&self) -> bool {
        self.status == MeetingStatus::Canceled
    }

    /// The actor an action on this meeting is attributed to: the first
    /// attendee, or `system@local` for meetings without guests.
    pub fn actor(&self) -> &str {
        self.attendees
            .first()
            .map(String::as_str)
            .unwrap_or("system@local")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn resolve_with_date_and_time() {
        let draft = MeetingDraft::new("Roadmap")
            .with_date("2025-11-16")
            .with_start_time("16:00")
            .with_duration_min(45)
            .with_timezone("America/Mexico_City");
        let schedule = draft.resolve(utc(2025, 11, 15, 12, 0, 0)).unwrap();
        // 16:00 in Mexico City is 22:00 UTC.
        assert_eq!(schedule.start, utc(2025, 11, 16, 22, 0, 0));
        assert_eq!(schedule.end, utc(2025, 11, 16, 22, 45, 0));
    }

    #[test]
    fn resolve_without_schedule_starts_now() {
        let now = utc(2025, 11, 16, 10, 30, 5);
        let draft = MeetingDraft::new("Quick sync");
        let schedule = draft.resolve(now).unwrap();
        assert_eq!(schedule.start, now);
        assert_eq!(schedule.end, now + Duration::minutes(30));
    }

    #[test]
    fn resolve_rejects_bad_date() {
        let draft = MeetingDraft::new("X")
            .with_date("16/11/2025")
            .with_start_time("16:00");
        assert!(matches!(
            draft.resolve(utc(2025, 11, 15, 0, 0, 0)),
            Err(MeetingError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn resolve_rejects_bad_time() {
        let draft = MeetingDraft::new("X")
            .with_date("2025-11-16")
            .with_start_time("4pm");
        assert!(matches!(
            draft.resolve(utc(2025, 11, 15, 0, 0, 0)),
            Err(MeetingError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn resolve_rejects_out_of_range_duration() {
        let draft = MeetingDraft::new("X").with_duration_min(500);
        assert_eq!(
            draft.resolve(utc(2025, 11, 15, 0, 0, 0)),
            Err(MeetingError::DurationOutOfRange(500))
        );
    }

    #[test]
    fn resolve_rejects_unknown_timezone() {
        let draft = MeetingDraft::new("X").with_timezone("Mars/Olympus_Mons");
        assert!(matches!(
            draft.resolve(utc(2025, 11, 15, 0, 0, 0)),
            Err(MeetingError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn meeting_from_draft_and_cancel() {
        let now = utc(2025, 11, 15, 12, 0, 0);
        let draft = MeetingDraft::new("Standup")
            .with_date("2025-11-16")
            .with_start_time("09:00")
            .with_timezone("UTC")
            .with_attendees(vec!["maria@example.com".into()]);
        let mut meeting = Meeting::from_draft("mtg-1", &draft, now).unwrap();

        assert_eq!(meeting.status, MeetingStatus::Created);
        assert_eq!(meeting.actor(), "maria@example.com");
        assert_eq!(meeting.start, utc(2025, 11, 16, 9, 0, 0));
        assert_eq!(meeting.created_at, now);

        let later = utc(2025, 11, 15, 13, 0, 0);
        meeting.cancel(later);
        assert!(meeting.is_canceled());
        assert_eq!(meeting.canceled_at, Some(later));
    }

    #[test]
    fn actor_defaults_to_system() {
        let meeting = Meeting::from_draft(
            "mtg-2",
            &MeetingDraft::new("Solo"),
            utc(2025, 11, 15, 12, 0, 0),
        )
        .unwrap();
        assert_eq!(meeting.actor(), "system@local");
    }

    #[test]
    fn draft_serde_defaults() {
        let draft: MeetingDraft = serde_json::from_str(r#"{"title":"Sync"}"#).unwrap();
        assert_eq!(draft.duration_min, 30);
        assert_eq!(draft.timezone, DEFAULT_TIMEZONE);
        assert!(draft.attendees.is_empty());
    }
}
