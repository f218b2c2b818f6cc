//! Collaborator traits and implementations for meetwise.
//!
//! The scheduling core consumes three external collaborators, each behind an
//! object-safe trait:
//!
//! - [`CalendarProvider`] — busy intervals (free/busy query) and event CRUD,
//!   implemented for Google Calendar in [`google`]
//! - [`IntentParser`] — free text to structured [`MeetingIntent`], implemented
//!   against a hosted chat-completions router in [`intent`]
//! - [`MeetingStore`] — meeting records and the action log, with an
//!   in-memory implementation in [`store`]
//!
//! Raw provider timestamps are normalized to UTC here, at the boundary; the
//! slot-computation core never sees mixed-offset values.
//!
//! [`MeetingIntent`]: meetwise_core::MeetingIntent

pub mod calendar;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod intent;
pub mod store;

pub use calendar::{BoxFuture, CalendarProvider, EventPatch, StaticCalendarProvider};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use intent::{IntentParser, ScriptedIntentParser};
pub use store::{MemoryStore, MeetingStore};
