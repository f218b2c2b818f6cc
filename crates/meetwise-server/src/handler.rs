//! Request/response dispatch handler.
//!
//! Routes incoming protocol requests to the collaborators (store, calendar
//! provider, intent parser) and the slot-computation core, and produces
//! responses. Core validation failures map to `InvalidRequest`; collaborator
//! failures map through their error classification.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use meetwise_core::{
    chunk, free_slots, ActionKind, ActionRecord, DayWindow, Meeting, MeetingDraft, MeetingError,
    MeetingIntent, SlotError,
};
use meetwise_protocol::{
    AvailabilityQuery, CollaboratorStatus, ErrorCode, ErrorResponse, Request, Response, StatusInfo,
};
use meetwise_providers::store::DEFAULT_ACTION_LIMIT;
use meetwise_providers::{
    CalendarProvider, EventPatch, IntentParser, MeetingStore, ProviderError, ProviderErrorCode,
};

use crate::error::{ServerError, ServerResult};
use crate::signals::ShutdownSignal;
use crate::socket::Connection;

/// Server state shared across all connections.
///
/// Collaborator handles never change after startup; the only mutable piece
/// is the shutdown flag, which has interior mutability of its own.
pub struct ServerState {
    start_time: DateTime<Utc>,
    default_timezone: String,
    store: Arc<dyn MeetingStore>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    intent: Option<Arc<dyn IntentParser>>,
    shutdown: ShutdownSignal,
}

impl ServerState {
    /// Creates a state around a meeting store.
    pub fn new(store: Arc<dyn MeetingStore>, default_timezone: impl Into<String>) -> Self {
        Self {
            start_time: Utc::now(),
            default_timezone: default_timezone.into(),
            store,
            calendar: None,
            intent: None,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Builder: attach a calendar provider.
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Builder: attach an intent parser.
    pub fn with_intent_parser(mut self, intent: Arc<dyn IntentParser>) -> Self {
        self.intent = Some(intent);
        self
    }

    /// The shutdown signal shared with the accept loop.
    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Server uptime in whole seconds.
    pub fn uptime_seconds(&self) -> u64 {
        let duration = Utc::now() - self.start_time;
        duration.num_seconds().max(0) as u64
    }
}

/// Shared server state.
pub type SharedState = Arc<ServerState>;

/// Wraps a state for sharing across connections.
pub fn new_shared_state(state: ServerState) -> SharedState {
    Arc::new(state)
}

/// Maps a core scheduling failure to a protocol error.
fn meeting_error(e: MeetingError) -> ErrorResponse {
    ErrorResponse::invalid_request(e.to_string())
}

/// Maps a slot-engine validation failure to a protocol error.
fn slot_error(e: SlotError) -> ErrorResponse {
    ErrorResponse::invalid_request(e.to_string())
}

/// Maps a collaborator failure through its classification.
fn provider_error(e: ProviderError) -> ErrorResponse {
    let code = match e.code() {
        ProviderErrorCode::AuthenticationFailed | ProviderErrorCode::AuthorizationFailed => {
            ErrorCode::AuthenticationFailed
        }
        ProviderErrorCode::RateLimited => ErrorCode::RateLimited,
        ProviderErrorCode::NotFound => ErrorCode::NotFound,
        ProviderErrorCode::BadRequest => ErrorCode::InvalidRequest,
        _ => ErrorCode::ProviderError,
    };
    ErrorResponse::new(code, e.to_string())
}

/// Request handler that processes incoming requests and produces responses.
pub struct RequestHandler {
    state: SharedState,
}

impl RequestHandler {
    /// Creates a handler over the given state.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Handles a single request and returns the response.
    #[tracing::instrument(skip_all, fields(request_type))]
    pub async fn handle(&self, request: &Request) -> Response {
        tracing::Span::current().record("request_type", format!("{request:?}").as_str());

        let result = match request {
            Request::Ping => Ok(Response::Pong),
            Request::Status => self.status().await,
            Request::ListMeetings { limit } => self.list_meetings(*limit).await,
            Request::CreateMeeting { draft } => self
                .create_meeting(draft)
                .await
                .map(|meeting| Response::Meeting { meeting }),
            Request::CancelMeeting { meeting_id, user } => self
                .cancel_meeting(meeting_id, Some(user))
                .await
                .map(|meeting| Response::Meeting { meeting }),
            Request::RescheduleMeeting {
                meeting_id,
                date,
                start_time,
                duration_min,
                user,
            } => self
                .reschedule_meeting(
                    meeting_id,
                    date.as_deref(),
                    start_time.as_deref(),
                    *duration_min,
                    user,
                )
                .await
                .map(|meeting| Response::Meeting { meeting }),
            Request::Availability(query) => self.availability(query).await,
            Request::ParseIntent {
                text,
                default_timezone,
            } => self
                .parse_intent(text, default_timezone.as_deref())
                .await
                .map(|intent| Response::Intent { intent }),
            Request::CreateFromText {
                text,
                default_timezone,
            } => self.create_from_text(text, default_timezone.as_deref()).await,
            Request::ListActions { limit } => self.list_actions(*limit).await,
            Request::Shutdown => {
                info!("shutdown requested over the protocol");
                self.state.shutdown.trigger();
                Ok(Response::Ok)
            }
        };

        match result {
            Ok(response) => response,
            Err(error) => {
                debug!(code = ?error.code, message = %error.message, "request failed");
                Response::from_error(error)
            }
        }
    }

    fn calendar(&self) -> Result<&Arc<dyn CalendarProvider>, ErrorResponse> {
        self.state.calendar.as_ref().ok_or_else(|| {
            ErrorResponse::new(ErrorCode::ProviderError, "no calendar provider configured")
        })
    }

    fn intent_parser(&self) -> Result<&Arc<dyn IntentParser>, ErrorResponse> {
        self.state.intent.as_ref().ok_or_else(|| {
            ErrorResponse::new(ErrorCode::ProviderError, "no intent parser configured")
        })
    }

    async fn status(&self) -> Result<Response, ErrorResponse> {
        let state = &self.state;
        let meeting_count = state.store.meeting_count().await.map_err(provider_error)?;

        let mut info = StatusInfo::new(state.uptime_seconds(), meeting_count)
            .with_collaborator(CollaboratorStatus::healthy(state.store.name()));

        info = info.with_collaborator(match &state.calendar {
            Some(calendar) if calendar.is_authenticated() => {
                CollaboratorStatus::healthy(calendar.name())
            }
            Some(calendar) => CollaboratorStatus::unhealthy(calendar.name(), "not authenticated"),
            None => CollaboratorStatus::unhealthy("calendar", "not configured"),
        });

        info = info.with_collaborator(match &state.intent {
            Some(parser) => CollaboratorStatus::healthy(parser.name()),
            None => CollaboratorStatus::unhealthy("intent", "not configured"),
        });

        Ok(Response::Status { info })
    }

    async fn list_meetings(&self, limit: Option<usize>) -> Result<Response, ErrorResponse> {
        let meetings = self
            .state
            .store
            .list_meetings(limit)
            .await
            .map_err(provider_error)?;
        debug!(meeting_count = meetings.len(), "returning meetings");
        Ok(Response::Meetings { meetings })
    }

    async fn list_actions(&self, limit: Option<usize>) -> Result<Response, ErrorResponse> {
        let actions = self
            .state
            .store
            .list_actions(limit.unwrap_or(DEFAULT_ACTION_LIMIT))
            .await
            .map_err(provider_error)?;
        Ok(Response::Actions { actions })
    }

    /// Computes the free gaps (and optionally slots) of one day.
    ///
    /// The busy list is fetched fresh from the calendar provider; the only
    /// suspension point is that fetch. Everything after it is pure.
    async fn availability(&self, query: &AvailabilityQuery) -> Result<Response, ErrorResponse> {
        let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").map_err(|_| {
            ErrorResponse::invalid_request(format!("bad date {:?}, use YYYY-MM-DD", query.date))
        })?;

        let tz_name = query
            .timezone
            .as_deref()
            .unwrap_or(&self.state.default_timezone);
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| ErrorResponse::invalid_request(format!("unknown timezone {tz_name:?}")))?;

        let day = DayWindow::for_date(date, tz);
        let busy = self
            .calendar()?
            .busy_intervals(day.interval())
            .await
            .map_err(provider_error)?;

        let min_slot = Duration::minutes(i64::from(query.min_slot_minutes.unwrap_or(30)));
        let free = free_slots(&day, &busy, min_slot).map_err(slot_error)?;

        let slots = match query.slot_minutes {
            Some(minutes) => {
                let slot = Duration::minutes(i64::from(minutes));
                let mut all = Vec::new();
                for gap in &free {
                    all.extend(chunk(gap, slot).map_err(slot_error)?);
                }
                Some(all)
            }
            None => None,
        };

        debug!(
            date = %query.date,
            timezone = tz_name,
            busy_count = busy.len(),
            free_count = free.len(),
            "availability computed"
        );

        Ok(Response::Availability {
            date: query.date.clone(),
            timezone: tz_name.to_string(),
            free,
            slots,
        })
    }

    async fn create_meeting(&self, draft: &MeetingDraft) -> Result<Meeting, ErrorResponse> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let mut meeting = Meeting::from_draft(&id, draft, now).map_err(meeting_error)?;

        if let Some(calendar) = &self.state.calendar {
            let event_id = calendar
                .insert_event(&meeting)
                .await
                .map_err(provider_error)?;
            meeting.provider_event_id = Some(event_id);
        }

        self.state
            .store
            .insert_meeting(meeting.clone())
            .await
            .map_err(provider_error)?;

        let actor = meeting.actor().to_string();
        self.log_action(ActionKind::Create, &meeting.id, &actor, now)
            .await?;

        info!(meeting_id = %meeting.id, title = %meeting.title, "meeting created");
        Ok(meeting)
    }

    async fn cancel_meeting(
        &self,
        meeting_id: &str,
        user: Option<&str>,
    ) -> Result<Meeting, ErrorResponse> {
        let mut meeting = self
            .state
            .store
            .get_meeting(meeting_id)
            .await
            .map_err(provider_error)?
            .ok_or_else(|| ErrorResponse::not_found(format!("meeting {meeting_id}")))?;

        if meeting.is_canceled() {
            return Err(ErrorResponse::invalid_request(format!(
                "meeting {meeting_id} is already canceled"
            )));
        }

        let now = Utc::now();
        if let (Some(calendar), Some(event_id)) =
            (&self.state.calendar, meeting.provider_event_id.clone())
        {
            match calendar.delete_event(&event_id).await {
                Ok(()) => {}
                Err(e) if e.code() == ProviderErrorCode::NotFound => {
                    warn!(event_id = %event_id, "provider event already gone");
                }
                Err(e) => return Err(provider_error(e)),
            }
        }

        meeting.cancel(now);
        self.state
            .store
            .update_meeting(meeting.clone())
            .await
            .map_err(provider_error)?;

        let user = user.unwrap_or_else(|| meeting.actor()).to_string();
        self.log_action(ActionKind::Cancel, &meeting.id, &user, now)
            .await?;

        info!(meeting_id = %meeting.id, "meeting canceled");
        Ok(meeting)
    }

    async fn reschedule_meeting(
        &self,
        meeting_id: &str,
        date: Option<&str>,
        start_time: Option<&str>,
        duration_min: Option<u32>,
        user: &str,
    ) -> Result<Meeting, ErrorResponse> {
        let mut meeting = self
            .state
            .store
            .get_meeting(meeting_id)
            .await
            .map_err(provider_error)?
            .ok_or_else(|| ErrorResponse::not_found(format!("meeting {meeting_id}")))?;

        if meeting.is_canceled() {
            return Err(ErrorResponse::invalid_request(format!(
                "meeting {meeting_id} is canceled"
            )));
        }

        // The stored timezone was validated at creation time.
        let tz: Tz = meeting.timezone.parse().map_err(|_| {
            ErrorResponse::internal(format!("stored timezone {:?} is invalid", meeting.timezone))
        })?;
        let local = meeting.start.with_timezone(&tz);

        let draft = MeetingDraft {
            title: meeting.title.clone(),
            date: Some(
                date.map(str::to_string)
                    .unwrap_or_else(|| local.format("%Y-%m-%d").to_string()),
            ),
            start_time: Some(
                start_time
                    .map(str::to_string)
                    .unwrap_or_else(|| local.format("%H:%M").to_string()),
            ),
            duration_min: duration_min.unwrap_or(meeting.duration_min),
            attendees: meeting.attendees.clone(),
            agenda: meeting.agenda.clone(),
            timezone: meeting.timezone.clone(),
        };

        let now = Utc::now();
        let schedule = draft.resolve(now).map_err(meeting_error)?;

        if let (Some(calendar), Some(event_id)) =
            (&self.state.calendar, meeting.provider_event_id.clone())
        {
            calendar
                .patch_event(&event_id, &EventPatch::reschedule(schedule.start, schedule.end))
                .await
                .map_err(provider_error)?;
        }

        meeting.start = schedule.start;
        meeting.end = schedule.end;
        meeting.duration_min = draft.duration_min;
        self.state
            .store
            .update_meeting(meeting.clone())
            .await
            .map_err(provider_error)?;

        self.log_action(ActionKind::Reschedule, &meeting.id, user, now)
            .await?;

        info!(meeting_id = %meeting.id, start = %meeting.start, "meeting rescheduled");
        Ok(meeting)
    }

    async fn parse_intent(
        &self,
        text: &str,
        default_timezone: Option<&str>,
    ) -> Result<MeetingIntent, ErrorResponse> {
        let parser = self.intent_parser()?;
        let mut intent = parser
            .parse(text, Utc::now())
            .await
            .map_err(provider_error)?;

        // The original instruction may omit the zone; fill it from the
        // request default so downstream consumers never guess.
        if let MeetingIntent::Create(ref mut create) = intent
            && create.timezone.as_deref().is_none_or(str::is_empty)
        {
            create.timezone = Some(
                default_timezone
                    .unwrap_or(&self.state.default_timezone)
                    .to_string(),
            );
        }

        Ok(intent)
    }

    async fn create_from_text(
        &self,
        text: &str,
        default_timezone: Option<&str>,
    ) -> Result<Response, ErrorResponse> {
        let intent = self.parse_intent(text, default_timezone).await?;

        match intent.clone() {
            MeetingIntent::Create(create) => {
                if create.title.is_empty() {
                    return Err(ErrorResponse::invalid_request(
                        "no title detected in the instruction",
                    ));
                }
                let default_tz = default_timezone.unwrap_or(&self.state.default_timezone);
                let draft = create.into_draft(default_tz);
                let meeting = self.create_meeting(&draft).await?;
                Ok(Response::Planned { meeting, intent })
            }
            MeetingIntent::Cancel { meeting_id } => {
                let meeting = self.cancel_meeting(&meeting_id, None).await?;
                Ok(Response::Planned { meeting, intent })
            }
            MeetingIntent::Unclear { reason } => Err(ErrorResponse::invalid_request(format!(
                "instruction unclear: {reason}"
            ))),
        }
    }

    async fn log_action(
        &self,
        kind: ActionKind,
        subject_id: &str,
        user: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ErrorResponse> {
        let record = ActionRecord::new(Uuid::new_v4().to_string(), kind, subject_id, user, at);
        self.state
            .store
            .append_action(record)
            .await
            .map_err(provider_error)
    }

    /// Handles a connection, processing requests until it closes.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        loop {
            match conn.read_request().await {
                Ok(Some(envelope)) => {
                    let response = self.handle(&envelope.payload).await;
                    conn.respond(&envelope.request_id, response).await?;

                    if self.state.shutdown.is_triggered() {
                        return Err(ServerError::Shutdown);
                    }
                }
                Ok(None) => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "error reading request");
                    return Err(e);
                }
            }
        }
    }
}

/// Creates a connection handler function for use with `SocketServer::run`.
pub fn make_connection_handler(
    state: SharedState,
) -> impl Fn(Connection) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |conn| {
        let handler = RequestHandler::new(state.clone());
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await
                && !matches!(e, ServerError::Shutdown)
            {
                warn!(error = %e, "connection handler error");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use meetwise_core::{CreateIntent, TimeInterval};
    use meetwise_providers::{MemoryStore, ScriptedIntentParser, StaticCalendarProvider};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn handler_with(
        calendar: Option<Arc<dyn CalendarProvider>>,
        intent: Option<Arc<dyn IntentParser>>,
    ) -> RequestHandler {
        let mut state = ServerState::new(Arc::new(MemoryStore::new()), "UTC");
        if let Some(calendar) = calendar {
            state = state.with_calendar(calendar);
        }
        if let Some(intent) = intent {
            state = state.with_intent_parser(intent);
        }
        RequestHandler::new(new_shared_state(state))
    }

    fn full_handler(busy: Vec<TimeInterval>, intent: MeetingIntent) -> RequestHandler {
        handler_with(
            Some(Arc::new(StaticCalendarProvider::new(busy))),
            Some(Arc::new(ScriptedIntentParser::new(intent))),
        )
    }

    fn sample_draft() -> MeetingDraft {
        MeetingDraft::new("Standup")
            .with_date("2025-11-16")
            .with_start_time("09:00")
            .with_timezone("UTC")
            .with_attendees(vec!["maria@example.com".into()])
    }

    #[tokio::test]
    async fn ping_pongs() {
        let handler = handler_with(None, None);
        assert_eq!(handler.handle(&Request::Ping).await, Response::Pong);
    }

    #[tokio::test]
    async fn status_reports_collaborators() {
        let handler = full_handler(vec![], MeetingIntent::Unclear { reason: "".into() });
        let response = handler.handle(&Request::Status).await;
        match response {
            Response::Status { info } => {
                assert_eq!(info.meeting_count, 0);
                assert_eq!(info.collaborators.len(), 3);
                assert!(info.collaborators.iter().all(|c| c.healthy));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_flags_missing_collaborators() {
        let handler = handler_with(None, None);
        let response = handler.handle(&Request::Status).await;
        match response {
            Response::Status { info } => {
                let unhealthy: Vec<_> =
                    info.collaborators.iter().filter(|c| !c.healthy).collect();
                assert_eq!(unhealthy.len(), 2);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_list_cancel_flow() {
        let handler = full_handler(vec![], MeetingIntent::Unclear { reason: "".into() });

        let created = match handler
            .handle(&Request::CreateMeeting {
                draft: sample_draft(),
            })
            .await
        {
            Response::Meeting { meeting } => meeting,
            other => panic!("unexpected response: {other:?}"),
        };
        assert!(created.provider_event_id.is_some());
        assert_eq!(created.start, utc(2025, 11, 16, 9, 0));

        match handler.handle(&Request::list_meetings()).await {
            Response::Meetings { meetings } => {
                assert_eq!(meetings.len(), 1);
                assert_eq!(meetings[0].id, created.id);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let canceled = match handler
            .handle(&Request::CancelMeeting {
                meeting_id: created.id.clone(),
                user: "maria@example.com".into(),
            })
            .await
        {
            Response::Meeting { meeting } => meeting,
            other => panic!("unexpected response: {other:?}"),
        };
        assert!(canceled.is_canceled());

        // Second cancel is rejected, not silently repeated.
        let again = handler
            .handle(&Request::CancelMeeting {
                meeting_id: created.id.clone(),
                user: "maria@example.com".into(),
            })
            .await;
        assert_eq!(again.as_error().unwrap().code, ErrorCode::InvalidRequest);

        // Both mutations are in the action log, newest first.
        match handler.handle(&Request::ListActions { limit: None }).await {
            Response::Actions { actions } => {
                assert_eq!(actions.len(), 2);
                assert_eq!(actions[0].kind, ActionKind::Cancel);
                assert_eq!(actions[1].kind, ActionKind::Create);
                assert_eq!(actions[1].user, "maria@example.com");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_unknown_meeting_is_not_found() {
        let handler = handler_with(None, None);
        let response = handler
            .handle(&Request::CancelMeeting {
                meeting_id: "ghost".into(),
                user: "maria@example.com".into(),
            })
            .await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn reschedule_moves_meeting_and_logs() {
        let handler = full_handler(vec![], MeetingIntent::Unclear { reason: "".into() });

        let created = match handler
            .handle(&Request::CreateMeeting {
                draft: sample_draft(),
            })
            .await
        {
            Response::Meeting { meeting } => meeting,
            other => panic!("unexpected response: {other:?}"),
        };

        let moved = match handler
            .handle(&Request::RescheduleMeeting {
                meeting_id: created.id.clone(),
                date: Some("2025-11-17".into()),
                start_time: Some("15:00".into()),
                duration_min: Some(60),
                user: "maria@example.com".into(),
            })
            .await
        {
            Response::Meeting { meeting } => meeting,
            other => panic!("unexpected response: {other:?}"),
        };
        assert_eq!(moved.start, utc(2025, 11, 17, 15, 0));
        assert_eq!(moved.end, utc(2025, 11, 17, 16, 0));
        assert_eq!(moved.duration_min, 60);

        match handler.handle(&Request::ListActions { limit: None }).await {
            Response::Actions { actions } => {
                assert_eq!(actions[0].kind, ActionKind::Reschedule);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn availability_end_to_end() {
        let busy =
            vec![TimeInterval::new(utc(2025, 11, 16, 13, 0), utc(2025, 11, 16, 14, 0)).unwrap()];
        let handler = full_handler(busy, MeetingIntent::Unclear { reason: "".into() });

        let query = AvailabilityQuery::for_date("2025-11-16")
            .with_timezone("UTC")
            .with_min_slot_minutes(30)
            .with_slot_minutes(30);
        let response = handler.handle(&Request::availability(query)).await;

        match response {
            Response::Availability {
                free,
                slots,
                timezone,
                ..
            } => {
                assert_eq!(timezone, "UTC");
                assert_eq!(free.len(), 2);
                assert_eq!(free[0].end(), utc(2025, 11, 16, 13, 0));
                assert_eq!(free[1].start(), utc(2025, 11, 16, 14, 0));
                // 26 slots before the meeting, 20 after.
                assert_eq!(slots.unwrap().len(), 46);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn availability_rejects_bad_inputs() {
        let handler = full_handler(vec![], MeetingIntent::Unclear { reason: "".into() });

        let bad_date = handler
            .handle(&Request::availability(AvailabilityQuery::for_date(
                "16/11/2025",
            )))
            .await;
        assert_eq!(bad_date.as_error().unwrap().code, ErrorCode::InvalidRequest);

        let bad_tz = handler
            .handle(&Request::availability(
                AvailabilityQuery::for_date("2025-11-16").with_timezone("Narnia/Lamppost"),
            ))
            .await;
        assert_eq!(bad_tz.as_error().unwrap().code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn availability_without_calendar_is_a_provider_error() {
        let handler = handler_with(None, None);
        let response = handler
            .handle(&Request::availability(AvailabilityQuery::for_date(
                "2025-11-16",
            )))
            .await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::ProviderError);
    }

    #[tokio::test]
    async fn parse_intent_fills_default_timezone() {
        let intent = MeetingIntent::Create(CreateIntent {
            title: "Roadmap".into(),
            date: Some("2025-11-17".into()),
            start_time: Some("16:00".into()),
            duration_min: 45,
            attendees: vec!["maria@example.com".into()],
            agenda: String::new(),
            timezone: None,
        });
        let handler = full_handler(vec![], intent);

        let response = handler
            .handle(&Request::ParseIntent {
                text: "agenda mañana a las 4pm con Maria".into(),
                default_timezone: Some("America/Mexico_City".into()),
            })
            .await;

        match response {
            Response::Intent { intent } => {
                let create = intent.as_create().unwrap();
                assert_eq!(create.timezone.as_deref(), Some("America/Mexico_City"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_from_text_creates_and_reports_intent() {
        let intent = MeetingIntent::Create(CreateIntent {
            title: "Roadmap".into(),
            date: Some("2025-11-17".into()),
            start_time: Some("16:00".into()),
            duration_min: 45,
            attendees: vec!["maria@example.com".into()],
            agenda: "roadmap".into(),
            timezone: Some("UTC".into()),
        });
        let handler = full_handler(vec![], intent);

        let response = handler
            .handle(&Request::CreateFromText {
                text: "agenda roadmap mañana 16:00 por 45 min con maria@example.com".into(),
                default_timezone: None,
            })
            .await;

        match response {
            Response::Planned { meeting, intent } => {
                assert_eq!(meeting.title, "Roadmap");
                assert_eq!(meeting.start, utc(2025, 11, 17, 16, 0));
                assert!(intent.as_create().is_some());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unclear_instruction_is_rejected() {
        let handler = full_handler(
            vec![],
            MeetingIntent::Unclear {
                reason: "no date given".into(),
            },
        );
        let response = handler
            .handle(&Request::CreateFromText {
                text: "agenda algo".into(),
                default_timezone: None,
            })
            .await;
        let error = response.as_error().unwrap();
        assert_eq!(error.code, ErrorCode::InvalidRequest);
        assert!(error.message.contains("no date given"));
    }

    #[tokio::test]
    async fn shutdown_triggers_signal() {
        let handler = handler_with(None, None);
        assert!(!handler.state.shutdown().is_triggered());
        assert_eq!(handler.handle(&Request::Shutdown).await, Response::Ok);
        assert!(handler.state.shutdown().is_triggered());
    }
}
