//! Google Calendar provider implementation.
//!
//! Ties the API [`client`](super::client) and the token capability together
//! behind the [`CalendarProvider`] trait.

use std::sync::Arc;

use tracing::{debug, info};

use meetwise_core::{Meeting, TimeInterval};

use crate::calendar::{BoxFuture, CalendarProvider, EventPatch};
use crate::error::{ProviderError, ProviderResult};

use super::client::{
    ConferenceCreateRequest, ConferenceData, EventAttendee, EventDateTime, EventResource,
    GoogleCalendarClient,
};
use super::config::GoogleConfig;
use super::tokens::{RefreshingTokenProvider, TokenProvider};

/// Google Calendar provider.
pub struct GoogleCalendarProvider {
    config: GoogleConfig,
    client: GoogleCalendarClient,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleCalendarProvider {
    /// Creates a provider from configuration, loading persisted tokens.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let tokens = Arc::new(RefreshingTokenProvider::new(
            config.credentials.clone(),
            &config.token_path,
            config.timeout,
        )?);

        Self::with_token_provider(config, tokens)
    }

    /// Creates a provider with an externally supplied token capability.
    pub fn with_token_provider(
        config: GoogleConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> ProviderResult<Self> {
        let client = GoogleCalendarClient::new(config.timeout, &config.user_agent)?;
        info!(calendar_id = %config.calendar_id, "Google calendar provider ready");
        Ok(Self {
            config,
            client,
            tokens,
        })
    }
}

/// Maps a meeting onto the wire event shape, requesting a Meet link.
fn event_from_meeting(meeting: &Meeting) -> EventResource {
    EventResource {
        summary: Some(meeting.title.clone()),
        description: (!meeting.agenda.is_empty()).then(|| meeting.agenda.clone()),
        start: Some(EventDateTime::new(meeting.start, &meeting.timezone)),
        end: Some(EventDateTime::new(meeting.end, &meeting.timezone)),
        attendees: meeting
            .attendees
            .iter()
            .map(|email| EventAttendee {
                email: email.clone(),
            })
            .collect(),
        conference_data: Some(ConferenceData {
            create_request: Some(ConferenceCreateRequest {
                request_id: format!("meetwise-{}", meeting.id),
            }),
        }),
        ..EventResource::default()
    }
}

/// Maps a partial update onto the wire event shape.
fn event_from_patch(patch: &EventPatch, timezone: &str) -> EventResource {
    EventResource {
        summary: patch.title.clone(),
        description: patch.agenda.clone(),
        start: patch.start.map(|at| EventDateTime::new(at, timezone)),
        end: patch.end.map(|at| EventDateTime::new(at, timezone)),
        ..EventResource::default()
    }
}

impl CalendarProvider for GoogleCalendarProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn busy_intervals(
        &self,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<TimeInterval>>> {
        Box::pin(async move {
            let token = self.tokens.access_token().await?;
            // Timestamps are normalized to UTC on parse, so the response
            // zone is irrelevant; UTC keeps the query deterministic.
            let busy = self
                .client
                .freebusy(&token, &self.config.calendar_id, window, "UTC")
                .await
                .map_err(|e| e.with_provider(self.name()))?;
            debug!(busy_count = busy.len(), "fetched busy intervals");
            Ok(busy)
        })
    }

    fn insert_event(&self, meeting: &Meeting) -> BoxFuture<'_, ProviderResult<String>> {
        let event = event_from_meeting(meeting);
        Box::pin(async move {
            let token = self.tokens.access_token().await?;
            self.client
                .insert_event(&token, &self.config.calendar_id, &event)
                .await
                .map_err(|e| e.with_provider(self.name()))
        })
    }

    fn patch_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let event_id = event_id.to_string();
        let patch = event_from_patch(patch, "UTC");
        Box::pin(async move {
            let token = self.tokens.access_token().await?;
            self.client
                .patch_event(&token, &self.config.calendar_id, &event_id, &patch)
                .await
                .map_err(|e| e.with_provider(self.name()))
        })
    }

    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            let token = self.tokens.access_token().await?;
            self.client
                .delete_event(&token, &self.config.calendar_id, &event_id)
                .await
                .map_err(|e| e.with_provider(self.name()))
        })
    }

    fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }
}
