//! Response rendering for the CLI.
//!
//! `--json` prints the raw response payload; otherwise a compact
//! human-readable form. Daemon error responses become client errors so the
//! process exits non-zero.

use meetwise_core::{Meeting, TimeInterval};
use meetwise_protocol::Response;

use crate::error::{ClientError, ClientResult};

/// Prints a daemon response to stdout.
pub fn print_response(response: &Response, json: bool) -> ClientResult<()> {
    if let Some(error) = response.as_error() {
        return Err(ClientError::Server(error.clone()));
    }

    if json {
        let rendered = serde_json::to_string_pretty(response)
            .map_err(|e| ClientError::Protocol(format!("failed to render response: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    match response {
        Response::Pong => println!("pong"),
        Response::Ok => println!("ok"),
        Response::Status { info } => {
            println!(
                "uptime: {}s, meetings: {}",
                info.uptime_seconds, info.meeting_count
            );
            for collaborator in &info.collaborators {
                let state = if collaborator.healthy {
                    "ok".to_string()
                } else {
                    collaborator
                        .detail
                        .clone()
                        .unwrap_or_else(|| "unhealthy".to_string())
                };
                println!("  {}: {}", collaborator.name, state);
            }
        }
        Response::Meetings { meetings } => {
            if meetings.is_empty() {
                println!("no meetings");
            }
            for meeting in meetings {
                print_meeting(meeting);
            }
        }
        Response::Meeting { meeting } => print_meeting(meeting),
        Response::Planned { meeting, intent } => {
            print_meeting(meeting);
            println!(
                "intent: {}",
                serde_json::to_string(intent).unwrap_or_default()
            );
        }
        Response::Availability {
            date,
            timezone,
            free,
            slots,
        } => {
            println!("free on {date} ({timezone}):");
            if free.is_empty() {
                println!("  (none)");
            }
            for gap in free {
                println!("  {}", format_interval(gap));
            }
            if let Some(slots) = slots {
                println!("slots:");
                for slot in slots {
                    println!("  {}", format_interval(slot));
                }
            }
        }
        Response::Intent { intent } => {
            let rendered = serde_json::to_string_pretty(intent)
                .map_err(|e| ClientError::Protocol(format!("failed to render intent: {e}")))?;
            println!("{rendered}");
        }
        Response::Actions { actions } => {
            if actions.is_empty() {
                println!("no actions");
            }
            for action in actions {
                println!(
                    "{}  {:<10}  {} by {}",
                    action.date.format("%Y-%m-%d %H:%M:%S"),
                    action.kind,
                    action.subject_id,
                    action.user
                );
            }
        }
        Response::Error { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn print_meeting(meeting: &Meeting) {
    let status = match meeting.status {
        meetwise_core::MeetingStatus::Created => "",
        meetwise_core::MeetingStatus::Canceled => " [canceled]",
    };
    println!(
        "{}  {} - {}  {}{}",
        meeting.id,
        meeting.start.format("%Y-%m-%d %H:%M"),
        meeting.end.format("%H:%M"),
        meeting.title,
        status
    );
    if !meeting.attendees.is_empty() {
        println!("  attendees: {}", meeting.attendees.join(", "));
    }
}

fn format_interval(interval: &TimeInterval) -> String {
    format!(
        "{} - {}",
        interval.start().format("%Y-%m-%d %H:%M"),
        interval.end().format("%Y-%m-%d %H:%M")
    )
}
