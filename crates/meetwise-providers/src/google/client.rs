//! Google Calendar API client.
//!
//! A low-level HTTP client for the Calendar API v3: free/busy queries and
//! event insert/patch/delete. Authentication is a bearer token supplied per
//! call by a [`TokenProvider`]; this layer knows nothing about refresh.
//!
//! [`TokenProvider`]: super::tokens::TokenProvider

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use meetwise_core::TimeInterval;

use crate::error::{ProviderError, ProviderResult};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// A calendar event as sent to and received from the API.
///
/// Only the fields meetwise reads or writes; everything else passes through
/// Google untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    /// Provider-assigned event id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Event title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Event description (the meeting agenda).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Start bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,

    /// End bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,

    /// Invited attendees.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventAttendee>,

    /// Conference (Meet link) creation request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<ConferenceData>,
}

/// An event bound: an RFC 3339 instant plus the zone it is displayed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp with offset.
    pub date_time: String,
    /// IANA timezone for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Creates a bound from a UTC instant and a display zone.
    pub fn new(at: DateTime<Utc>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: at.to_rfc3339(),
            time_zone: Some(time_zone.into()),
        }
    }
}

/// An invited attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendee {
    /// Attendee email address.
    pub email: String,
}

/// Conference data attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    /// Request to create a Meet link for the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_request: Option<ConferenceCreateRequest>,
}

/// A conference creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceCreateRequest {
    /// Client-chosen idempotency key.
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    time_zone: &'a str,
    items: Vec<FreeBusyItem<'a>>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriod {
    start: String,
    end: String,
}

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Queries the free/busy state of a calendar over `window`.
    ///
    /// Busy periods are returned normalized to UTC, validated, and in the
    /// order the API reports them (ascending by start).
    pub async fn freebusy(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: TimeInterval,
        timezone: &str,
    ) -> ProviderResult<Vec<TimeInterval>> {
        let body = FreeBusyRequest {
            time_min: window.start().to_rfc3339(),
            time_max: window.end().to_rfc3339(),
            time_zone: timezone,
            items: vec![FreeBusyItem { id: calendar_id }],
        };

        let response = self
            .http
            .post(format!("{}/freeBusy", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response).await?;
        let parsed: FreeBusyResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse freeBusy response: {e}"))
        })?;

        let busy = parsed
            .calendars
            .get(calendar_id)
            .map(|c| c.busy.as_slice())
            .unwrap_or_default();

        let intervals = busy
            .iter()
            .map(|period| parse_busy_period(period))
            .collect::<ProviderResult<Vec<_>>>()?;

        debug!(
            calendar_id,
            busy_count = intervals.len(),
            "freeBusy query complete"
        );
        Ok(intervals)
    }

    /// Inserts an event, returning the provider-assigned event id.
    ///
    /// Conference creation is enabled and attendees are notified, matching
    /// the behavior users expect from the assistant.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &EventResource,
    ) -> ProviderResult<String> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .json(event)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response).await?;
        let created: EventResource = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse insert response: {e}"))
        })?;

        created
            .id
            .ok_or_else(|| ProviderError::invalid_response("insert response carries no event id"))
    }

    /// Applies a partial update to an event.
    pub async fn patch_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        patch: &EventResource,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .patch(&url)
            .bearer_auth(access_token)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .json(patch)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response).await?;
        Ok(())
    }

    /// Deletes an event, sending cancellations to attendees.
    pub async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .delete(&url)
            .bearer_auth(access_token)
            .query(&[("sendUpdates", "all")])
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response).await?;
        Ok(())
    }
}

/// Parses one busy period into a validated UTC interval.
fn parse_busy_period(period: &BusyPeriod) -> ProviderResult<TimeInterval> {
    let start = parse_rfc3339(&period.start)?;
    let end = parse_rfc3339(&period.end)?;
    TimeInterval::new(start, end).map_err(|e| {
        ProviderError::invalid_response(format!("malformed busy period from provider: {e}"))
    })
}

/// Parses an RFC 3339 timestamp of any offset into UTC.
fn parse_rfc3339(value: &str) -> ProviderResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ProviderError::invalid_response(format!("bad timestamp {value:?}: {e}")))
}

/// Maps reqwest transport failures to provider errors.
fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {e}"))
    } else {
        ProviderError::network(format!("request failed: {e}"))
    }
}

/// Maps API status codes to provider errors, passing successes through.
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {s} seconds"))
                .unwrap_or_default()
        )));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::authentication(
            "access token expired or invalid",
        ));
    }

    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::authorization("access denied to calendar"));
    }

    if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
        return Err(ProviderError::not_found("calendar or event not found"));
    }

    if status == reqwest::StatusCode::BAD_REQUEST {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::bad_request(format!(
            "API rejected request: {body}"
        )));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::server(format!(
            "API error ({status}): {body}"
        )));
    }

    Ok(response)
}
