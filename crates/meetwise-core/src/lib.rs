//! Core types: time intervals, free-slot computation, meetings, actions, intents

pub mod action;
pub mod intent;
pub mod meeting;
pub mod slots;
pub mod time;
pub mod tracing;

pub use action::{ActionKind, ActionRecord};
pub use intent::{CreateIntent, MeetingIntent};
pub use meeting::{Meeting, MeetingDraft, MeetingError, MeetingStatus, Schedule, DEFAULT_TIMEZONE};
pub use slots::{chunk, free_slots, SlotIter};
pub use time::{DayWindow, SlotError, TimeInterval};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
