//! In-memory meeting store.

use tokio::sync::RwLock;

use meetwise_core::{ActionRecord, Meeting};

use crate::calendar::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::MeetingStore;

#[derive(Debug, Default)]
struct Inner {
    /// Meetings in creation order.
    meetings: Vec<Meeting>,
    /// Action log in append order.
    actions: Vec<ActionRecord>,
}

/// A [`MeetingStore`] held entirely in memory.
///
/// The daemon's default store: records live for the lifetime of the
/// process, which is all the assistant needs when the calendar provider is
/// the durable system of record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeetingStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn insert_meeting(&self, meeting: Meeting) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            if inner.meetings.iter().any(|m| m.id == meeting.id) {
                return Err(ProviderError::internal(format!(
                    "duplicate meeting id {}",
                    meeting.id
                ))
                .with_provider(self.name()));
            }
            inner.meetings.push(meeting);
            Ok(())
        })
    }

    fn get_meeting(&self, id: &str) -> BoxFuture<'_, ProviderResult<Option<Meeting>>> {
        let id = id.to_string();
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.meetings.iter().find(|m| m.id == id).cloned())
        })
    }

    fn list_meetings(
        &self,
        limit: Option<usize>,
    ) -> BoxFuture<'_, ProviderResult<Vec<Meeting>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            let mut meetings = inner.meetings.clone();
            if let Some(limit) = limit {
                meetings.truncate(limit);
            }
            Ok(meetings)
        })
    }

    fn update_meeting(&self, meeting: Meeting) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            match inner.meetings.iter_mut().find(|m| m.id == meeting.id) {
                Some(slot) => {
                    *slot = meeting;
                    Ok(())
                }
                None => Err(ProviderError::not_found(format!(
                    "meeting {} does not exist",
                    meeting.id
                ))
                .with_provider(self.name())),
            }
        })
    }

    fn meeting_count(&self) -> BoxFuture<'_, ProviderResult<usize>> {
        Box::pin(async move { Ok(self.inner.read().await.meetings.len()) })
    }

    fn append_action(&self, action: ActionRecord) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.inner.write().await.actions.push(action);
            Ok(())
        })
    }

    fn list_actions(&self, limit: usize) -> BoxFuture<'_, ProviderResult<Vec<ActionRecord>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            let mut actions = inner.actions.clone();
            actions.sort_by(|a, b| b.date.cmp(&a.date));
            actions.truncate(limit);
            Ok(actions)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use meetwise_core::{ActionKind, MeetingDraft};

    fn meeting(id: &str, minute: u32) -> Meeting {
        let now = Utc.with_ymd_and_hms(2025, 11, 16, 12, minute, 0).unwrap();
        Meeting::from_draft(id, &MeetingDraft::new(format!("Meeting {id}")), now).unwrap()
    }

    #[tokio::test]
    async fn insert_get_list() {
        let store = MemoryStore::new();
        store.insert_meeting(meeting("a", 0)).await.unwrap();
        store.insert_meeting(meeting("b", 1)).await.unwrap();

        let fetched = store.get_meeting("a").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Meeting a");
        assert!(store.get_meeting("zzz").await.unwrap().is_none());

        let all = store.list_meetings(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");

        let limited = store.list_meetings(Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(store.meeting_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert_meeting(meeting("a", 0)).await.unwrap();
        assert!(store.insert_meeting(meeting("a", 1)).await.is_err());
    }

    #[tokio::test]
    async fn update_replaces_existing() {
        let store = MemoryStore::new();
        store.insert_meeting(meeting("a", 0)).await.unwrap();

        let mut changed = meeting("a", 0);
        changed.cancel(Utc.with_ymd_and_hms(2025, 11, 16, 13, 0, 0).unwrap());
        store.update_meeting(changed).await.unwrap();

        assert!(store.get_meeting("a").await.unwrap().unwrap().is_canceled());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_meeting(meeting("ghost", 0)).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::NotFound);
    }

    #[tokio::test]
    async fn actions_list_newest_first() {
        let store = MemoryStore::new();
        for (i, id) in ["one", "two", "three"].iter().enumerate() {
            let at = Utc
                .with_ymd_and_hms(2025, 11, 16, 12, i as u32, 0)
                .unwrap();
            store
                .append_action(ActionRecord::new(
                    format!("act-{id}"),
                    ActionKind::Create,
                    *id,
                    "maria@example.com",
                    at,
                ))
                .await
                .unwrap();
        }

        let actions = store.list_actions(2).await.unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].subject_id, "three");
        assert_eq!(actions[1].subject_id, "two");
    }
}
