//! meetwise CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use meetwise_client::cli::{Cli, Command, MeetingsAction};
use meetwise_client::config::ClientConfig;
use meetwise_client::render::print_response;
use meetwise_client::{commands, ClientError, ClientResult, SocketClient};
use meetwise_core::{init_tracing, MeetingDraft, TracingConfig};
use meetwise_protocol::{AvailabilityQuery, Request};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (Command::Server, _) => TracingConfig::daemon(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::default(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize tracing: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    if matches!(cli.command, Command::Server) {
        return commands::server::run(&cli, &config).await;
    }

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.socket_path.clone())
        .unwrap_or_else(meetwise_server::default_socket_path);
    let client = SocketClient::new(socket_path, Duration::from_secs(cli.timeout));
    let default_timezone = config.default_timezone.clone();

    let request = match cli.command {
        Command::Server => unreachable!("handled above"),
        Command::Status => Request::Status,
        Command::Ping => Request::Ping,
        Command::Meetings { action } => match action {
            MeetingsAction::List { limit } => Request::ListMeetings { limit },
            MeetingsAction::Create {
                title,
                date,
                time,
                duration,
                attendees,
                agenda,
                timezone,
            } => {
                let mut draft = MeetingDraft::new(title)
                    .with_duration_min(duration)
                    .with_attendees(attendees)
                    .with_agenda(agenda);
                if let Some(date) = date {
                    draft = draft.with_date(date);
                }
                if let Some(time) = time {
                    draft = draft.with_start_time(time);
                }
                if let Some(tz) = timezone.or_else(|| default_timezone.clone()) {
                    draft = draft.with_timezone(tz);
                }
                Request::CreateMeeting { draft }
            }
            MeetingsAction::Cancel { meeting_id, user } => {
                Request::CancelMeeting { meeting_id, user }
            }
            MeetingsAction::Reschedule {
                meeting_id,
                date,
                time,
                duration,
                user,
            } => Request::RescheduleMeeting {
                meeting_id,
                date,
                start_time: time,
                duration_min: duration,
                user,
            },
        },
        Command::Slots {
            date,
            timezone,
            min_minutes,
            slot_minutes,
        } => {
            let mut query = AvailabilityQuery::for_date(date);
            if let Some(tz) = timezone.or_else(|| default_timezone.clone()) {
                query = query.with_timezone(tz);
            }
            if let Some(min) = min_minutes {
                query = query.with_min_slot_minutes(min);
            }
            if let Some(slot) = slot_minutes {
                query = query.with_slot_minutes(slot);
            }
            Request::Availability(query)
        }
        Command::Intent { text } => Request::ParseIntent {
            text: text.join(" "),
            default_timezone,
        },
        Command::Plan { text } => Request::CreateFromText {
            text: text.join(" "),
            default_timezone,
        },
        Command::Actions { limit } => Request::ListActions { limit },
    };

    let response = client.send(request).await?;
    print_response(&response, cli.json)
}
