//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// meetwise - meeting scheduling from the command line
#[derive(Debug, Parser)]
#[command(name = "meetwise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output raw JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Path to the daemon socket
    #[arg(long, env = "MEETWISE_SOCKET")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long, default_value = "5")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the daemon in the foreground
    Server,

    /// Show daemon status
    Status,

    /// Check daemon liveness
    Ping,

    /// Manage meeting records
    Meetings {
        #[command(subcommand)]
        action: MeetingsAction,
    },

    /// Show the free gaps (and bookable slots) of a day
    Slots {
        /// Day to inspect, as YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// IANA timezone (daemon default when omitted)
        #[arg(long)]
        timezone: Option<String>,

        /// Minimum length of a reported gap, in minutes
        #[arg(long)]
        min_minutes: Option<u32>,

        /// Chunk gaps into bookable slots of this length, in minutes
        #[arg(long)]
        slot_minutes: Option<u32>,
    },

    /// Parse a free-text instruction into a structured intent
    Intent {
        /// The instruction, e.g. "agenda mañana a las 4pm con Maria"
        text: Vec<String>,
    },

    /// Parse a free-text instruction and act on it directly
    Plan {
        /// The instruction
        text: Vec<String>,
    },

    /// Show the most recent action-log entries
    Actions {
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Meeting record operations.
#[derive(Debug, Subcommand)]
pub enum MeetingsAction {
    /// List stored meetings
    List {
        /// Maximum number of meetings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Create a meeting
    Create {
        /// Meeting title
        #[arg(long)]
        title: String,

        /// Date as YYYY-MM-DD (now when omitted)
        #[arg(long)]
        date: Option<String>,

        /// Start time as HH:MM (now when omitted)
        #[arg(long)]
        time: Option<String>,

        /// Duration in minutes
        #[arg(long, default_value = "30")]
        duration: u32,

        /// Attendee email (can be repeated)
        #[arg(long = "attendee", action = clap::ArgAction::Append)]
        attendees: Vec<String>,

        /// Agenda text
        #[arg(long, default_value = "")]
        agenda: String,

        /// IANA timezone for the date/time
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Cancel a meeting
    Cancel {
        /// Identifier of the meeting
        meeting_id: String,

        /// User the cancellation is attributed to
        #[arg(long, default_value = "system@local")]
        user: String,
    },

    /// Move a meeting to a new date/time
    Reschedule {
        /// Identifier of the meeting
        meeting_id: String,

        /// New date as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// New start time as HH:MM
        #[arg(long)]
        time: Option<String>,

        /// New duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// User the change is attributed to
        #[arg(long, default_value = "system@local")]
        user: String,
    },
}
