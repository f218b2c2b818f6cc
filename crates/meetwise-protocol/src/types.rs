//! Request and response types for the meetwise protocol.

use meetwise_core::{ActionRecord, Meeting, MeetingDraft, MeetingIntent, TimeInterval};
use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// Every message exchanged between client and server is wrapped in this
/// envelope, which provides versioning and request correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// Unique request ID for correlation.
    pub request_id: String,
    /// The actual payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope with the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    /// Creates a request envelope.
    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    /// Creates a response envelope.
    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// Parameters of an availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// The day to inspect, as `YYYY-MM-DD`.
    pub date: String,

    /// IANA timezone the day is resolved in; the server default applies
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Minimum length of a reported free gap, in minutes (default 30).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_slot_minutes: Option<u32>,

    /// When set, each free gap is also chunked into bookable slots of this
    /// length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_minutes: Option<u32>,
}

impl AvailabilityQuery {
    /// Creates a query for the given day with server defaults.
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            timezone: None,
            min_slot_minutes: None,
            slot_minutes: None,
        }
    }

    /// Builder: set the timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Builder: set the minimum gap length.
    pub fn with_min_slot_minutes(mut self, minutes: u32) -> Self {
        self.min_slot_minutes = Some(minutes);
        self
    }

    /// Builder: request chunked slots of the given length.
    pub fn with_slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = Some(minutes);
        self
    }
}

/// Request types that can be sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check server liveness.
    Ping,

    /// Get server status.
    Status,

    /// List stored meetings in creation order.
    ListMeetings {
        /// Maximum number of meetings to return.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },

    /// Create a meeting from an explicit draft.
    CreateMeeting {
        /// The meeting to create.
        draft: MeetingDraft,
    },

    /// Cancel a stored meeting.
    CancelMeeting {
        /// Identifier of the meeting to cancel.
        meeting_id: String,
        /// User the cancellation is attributed to.
        user: String,
    },

    /// Move a stored meeting to a new date/time.
    RescheduleMeeting {
        /// Identifier of the meeting to move.
        meeting_id: String,
        /// New date as `YYYY-MM-DD`; keeps the current one when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        /// New start time as `HH:MM`; keeps the current one when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<String>,
        /// New duration in minutes; keeps the current one when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_min: Option<u32>,
        /// User the change is attributed to.
        user: String,
    },

    /// Compute the free gaps (and optionally bookable slots) of one day.
    Availability(AvailabilityQuery),

    /// Turn a free-text instruction into a structured intent.
    ParseIntent {
        /// The instruction text.
        text: String,
        /// Timezone to assume when the text names none.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_timezone: Option<String>,
    },

    /// Turn a free-text instruction into an intent and act on it directly.
    CreateFromText {
        /// The instruction text.
        text: String,
        /// Timezone to assume when the text names none.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_timezone: Option<String>,
    },

    /// List the most recent action-log entries, newest first.
    ListActions {
        /// Maximum number of entries to return (default 50).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },

    /// Request server shutdown.
    Shutdown,
}

impl Request {
    /// Creates a ListMeetings request without a limit.
    pub fn list_meetings() -> Self {
        Self::ListMeetings { limit: None }
    }

    /// Creates an Availability request.
    pub fn availability(query: AvailabilityQuery) -> Self {
        Self::Availability(query)
    }

    /// Creates a ParseIntent request.
    pub fn parse_intent(text: impl Into<String>) -> Self {
        Self::ParseIntent {
            text: text.into(),
            default_timezone: None,
        }
    }
}

/// Response types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to Ping.
    Pong,

    /// Generic success response.
    Ok,

    /// Server status information.
    Status {
        /// Status details.
        #[serde(flatten)]
        info: StatusInfo,
    },

    /// A list of stored meetings.
    Meetings {
        /// The meetings, in creation order.
        meetings: Vec<Meeting>,
    },

    /// A single meeting, after create/cancel/reschedule.
    Meeting {
        /// The affected meeting.
        meeting: Meeting,
    },

    /// A meeting created from free text, with the intent that produced it.
    Planned {
        /// The created meeting.
        meeting: Meeting,
        /// The intent the model extracted.
        intent: MeetingIntent,
    },

    /// The free gaps (and optionally slots) of one day.
    Availability {
        /// The day that was inspected, as `YYYY-MM-DD`.
        date: String,
        /// The timezone the day was resolved in.
        timezone: String,
        /// Free gaps in chronological order.
        free: Vec<TimeInterval>,
        /// Bookable slots, present when the query asked for chunking.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slots: Option<Vec<TimeInterval>>,
    },

    /// A structured intent extracted from free text.
    Intent {
        /// The extracted intent.
        intent: MeetingIntent,
    },

    /// Action-log entries, newest first.
    Actions {
        /// The log entries.
        actions: Vec<ActionRecord>,
    },

    /// Error response.
    Error {
        /// Error details.
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl Response {
    /// Creates an Error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse {
                code,
                message: message.into(),
            },
        }
    }

    /// Creates an error response from an ErrorResponse.
    pub fn from_error(error: ErrorResponse) -> Self {
        Self::Error { error }
    }

    /// Returns true if this is not an error response.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// Returns the error if this is an error response.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Server status information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Server uptime in seconds.
    pub uptime_seconds: u64,

    /// Number of stored meetings.
    pub meeting_count: usize,

    /// Health of each configured collaborator.
    pub collaborators: Vec<CollaboratorStatus>,
}

impl StatusInfo {
    /// Creates a new StatusInfo with no collaborators.
    pub fn new(uptime_seconds: u64, meeting_count: usize) -> Self {
        Self {
            uptime_seconds,
            meeting_count,
            collaborators: Vec::new(),
        }
    }

    /// Builder: add a collaborator status.
    pub fn with_collaborator(mut self, status: CollaboratorStatus) -> Self {
        self.collaborators.push(status);
        self
    }
}

/// Health of one external collaborator (calendar, intent parser, store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorStatus {
    /// Collaborator name (e.g., "google", "intent", "store").
    pub name: String,

    /// Whether the collaborator is currently usable.
    pub healthy: bool,

    /// Error detail when unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CollaboratorStatus {
    /// Creates a healthy status.
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            detail: None,
        }
    }

    /// Creates an unhealthy status with detail.
    pub fn unhealthy(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// Error codes for protocol errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown or internal error.
    InternalError,

    /// Invalid request: malformed input, bad interval or duration.
    InvalidRequest,

    /// Request timed out.
    Timeout,

    /// Collaborator authentication failed.
    AuthenticationFailed,

    /// A collaborator returned an error.
    ProviderError,

    /// Rate limited by a collaborator.
    RateLimited,

    /// Requested resource not found.
    NotFound,

    /// Server is shutting down.
    ShuttingDown,
}

impl ErrorCode {
    /// Returns a human-readable description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InternalError => "An internal error occurred",
            Self::InvalidRequest => "The request was invalid",
            Self::Timeout => "The request timed out",
            Self::AuthenticationFailed => "Authentication failed",
            Self::ProviderError => "A collaborator returned an error",
            Self::RateLimited => "Rate limited by a collaborator",
            Self::NotFound => "Requested resource not found",
            Self::ShuttingDown => "Server is shutting down",
        }
    }
}

/// Error response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_core::MeetingDraft;

    #[test]
    fn envelope_creation() {
        let envelope = Envelope::request("req-123", Request::Ping);
        assert_eq!(envelope.protocol_version, "1");
        assert_eq!(envelope.request_id, "req-123");
        assert!(envelope.is_compatible());
    }

    #[test]
    fn envelope_incompatible_version() {
        let envelope = Envelope {
            protocol_version: "2".to_string(),
            request_id: "req-123".to_string(),
            payload: Request::Ping,
        };
        assert!(!envelope.is_compatible());
    }

    #[test]
    fn request_serde_ping() {
        let json = serde_json::to_string(&Request::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Request::Ping);
    }

    #[test]
    fn request_serde_create_meeting() {
        let draft = MeetingDraft::new("Standup")
            .with_date("2025-11-16")
            .with_start_time("09:00");
        let request = Request::CreateMeeting { draft };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"create_meeting\""));
        assert!(json.contains("Standup"));

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn request_serde_availability() {
        let query = AvailabilityQuery::for_date("2025-11-16")
            .with_timezone("America/Mexico_City")
            .with_min_slot_minutes(30)
            .with_slot_minutes(30);
        let request = Request::availability(query);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"availability\""));
        assert!(json.contains("min_slot_minutes"));

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn availability_query_minimal() {
        let json = r#"{"type":"availability","date":"2025-11-16"}"#;
        let parsed: Request = serde_json::from_str(json).unwrap();
        match parsed {
            Request::Availability(query) => {
                assert_eq!(query.date, "2025-11-16");
                assert!(query.timezone.is_none());
                assert!(query.slot_minutes.is_none());
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn request_serde_parse_intent() {
        let request = Request::parse_intent("agenda mañana a las 4pm con Maria");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"parse_intent\""));

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn response_serde_error() {
        let response = Response::error(ErrorCode::InvalidRequest, "missing field");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("invalid_request"));
        assert!(json.contains("missing field"));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.as_error().unwrap().code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn response_serde_status() {
        let info = StatusInfo::new(3600, 4).with_collaborator(CollaboratorStatus::healthy("google"));
        let response = Response::Status { info };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("uptime_seconds"));
        assert!(json.contains("google"));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn response_serde_availability_omits_absent_slots() {
        let response = Response::Availability {
            date: "2025-11-16".into(),
            timezone: "UTC".into(),
            free: vec![],
            slots: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("slots"));
    }

    #[test]
    fn error_response_display() {
        let error = ErrorResponse::new(ErrorCode::NotFound, "meeting mtg-1");
        let display = error.to_string();
        assert!(display.contains("not found"));
        assert!(display.contains("mtg-1"));
    }

    #[test]
    fn full_envelope_roundtrip() {
        let request = Envelope::request("req-abc", Request::Shutdown);
        let json = serde_json::to_string(&request).unwrap();
        let parsed: Envelope<Request> = serde_json::from_str(&json).unwrap();
        assert_eq!(request, parsed);

        let response = Envelope::response("req-abc", Response::Ok);
        let json = serde_json::to_string(&response).unwrap();
        let parsed: Envelope<Response> = serde_json::from_str(&json).unwrap();
        assert_eq!(response, parsed);
    }
}
