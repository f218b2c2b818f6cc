//! Google Calendar implementation of the calendar collaborator.
//!
//! Split in layers:
//!
//! - [`config`] — OAuth credentials and provider settings
//! - [`tokens`] — token persistence and the "get valid token" capability
//! - [`client`] — low-level Calendar API v3 HTTP client
//! - [`provider`] — the [`CalendarProvider`] implementation tying them
//!   together
//!
//! [`CalendarProvider`]: crate::calendar::CalendarProvider

pub mod client;
pub mod config;
pub mod provider;
pub mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use provider::GoogleCalendarProvider;
pub use tokens::{RefreshingTokenProvider, TokenInfo, TokenProvider, TokenStorage};
