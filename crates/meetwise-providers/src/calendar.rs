//! CalendarProvider trait definition.
//!
//! The calendar provider is the collaborator that answers free/busy queries
//! and mirrors meeting mutations as calendar events. The daemon talks to it
//! exclusively through this trait; the free-slot computation itself never
//! performs I/O.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meetwise_core::{Meeting, TimeInterval};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Keeps the collaborator traits object-safe; implementations clone their
/// borrowed arguments into the future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A partial update to a mirrored calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    /// New title, when it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New start instant, when it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,

    /// New end instant, when it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,

    /// New agenda text, when it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<String>,
}

impl EventPatch {
    /// A patch moving the event to new bounds.
    pub fn reschedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    /// Returns true when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The calendar collaborator.
///
/// Implementations normalize every timestamp to UTC before returning it; the
/// slot engine only ever sees [`TimeInterval`] values in a single zone.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "google").
    fn name(&self) -> &str;

    /// Returns the busy intervals overlapping `window`, clipped to it and
    /// normalized to UTC. Fetched fresh on every call; nothing is cached.
    fn busy_intervals(
        &self,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<TimeInterval>>>;

    /// Mirrors a meeting as a calendar event, returning the provider's
    /// event id.
    fn insert_event(&self, meeting: &Meeting) -> BoxFuture<'_, ProviderResult<String>>;

    /// Applies a partial update to a mirrored event.
    fn patch_event(&self, event_id: &str, patch: &EventPatch)
        -> BoxFuture<'_, ProviderResult<()>>;

    /// Deletes a mirrored event, notifying attendees.
    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Whether the provider currently holds usable credentials.
    fn is_authenticated(&self) -> bool;
}

/// A provider backed by a fixed busy list, with no remote calls.
///
/// Useful as a stand-in when no real calendar is configured, and in tests
/// that exercise the daemon end to end.
#[derive(Debug, Default)]
pub struct StaticCalendarProvider {
    busy: Vec<TimeInterval>,
    next_event: AtomicU64,
}

impl StaticCalendarProvider {
    /// Creates a provider reporting the given busy intervals.
    pub fn new(busy: Vec<TimeInterval>) -> Self {
        Self {
            busy,
            next_event: AtomicU64::new(1),
        }
    }
}

impl CalendarProvider for StaticCalendarProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn busy_intervals(
        &self,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<TimeInterval>>> {
        let busy: Vec<TimeInterval> = self
            .busy
            .iter()
            .filter_map(|b| b.clip(&window))
            .collect();
        Box::pin(async move { Ok(busy) })
    }

    fn insert_event(&self, _meeting: &Meeting) -> BoxFuture<'_, ProviderResult<String>> {
        let n = self.next_event.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move { Ok(format!("static-evt-{n}")) })
    }

    fn patch_event(
        &self,
        _event_id: &str,
        _patch: &EventPatch,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_event(&self, _event_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn is_authenticated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 16, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn static_provider_clips_to_window() {
        let busy = vec![
            TimeInterval::new(utc(9, 0), utc(10, 0)).unwrap(),
            TimeInterval::new(utc(22, 0), utc(23, 0)).unwrap(),
        ];
        let provider = StaticCalendarProvider::new(busy);

        let window = TimeInterval::new(utc(8, 0), utc(12, 0)).unwrap();
        let result = provider.busy_intervals(window).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].start(), utc(9, 0));
    }

    #[tokio::test]
    async fn static_provider_assigns_event_ids() {
        let provider = StaticCalendarProvider::default();
        let meeting = Meeting::from_draft(
            "mtg-1",
            &meetwise_core::MeetingDraft::new("Sync"),
            utc(12, 0),
        )
        .unwrap();

        let first = provider.insert_event(&meeting).await.unwrap();
        let second = provider.insert_event(&meeting).await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("static-evt-"));
    }

    #[test]
    fn patch_emptiness() {
        assert!(EventPatch::default().is_empty());
        assert!(!EventPatch::reschedule(utc(9, 0), utc(10, 0)).is_empty());
    }
}
