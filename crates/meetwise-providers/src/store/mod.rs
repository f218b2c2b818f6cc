//! MeetingStore trait definition.
//!
//! The document-store collaborator: meeting records and the append-only
//! action log live behind this trait. The daemon ships with the in-memory
//! implementation in [`memory`]; a hosted document store plugs in the same
//! way.

use meetwise_core::{ActionRecord, Meeting};

use crate::calendar::BoxFuture;
use crate::error::ProviderResult;

pub mod memory;

pub use memory::MemoryStore;

/// Default number of action-log entries returned by a listing.
pub const DEFAULT_ACTION_LIMIT: usize = 50;

/// The meeting/action document store.
pub trait MeetingStore: Send + Sync {
    /// Returns the name of this store (e.g., "memory").
    fn name(&self) -> &str;

    /// Persists a new meeting record. The id must be unused.
    fn insert_meeting(&self, meeting: Meeting) -> BoxFuture<'_, ProviderResult<()>>;

    /// Fetches a meeting by id.
    fn get_meeting(&self, id: &str) -> BoxFuture<'_, ProviderResult<Option<Meeting>>>;

    /// Lists meetings in creation order, up to `limit` when given.
    fn list_meetings(&self, limit: Option<usize>)
        -> BoxFuture<'_, ProviderResult<Vec<Meeting>>>;

    /// Replaces an existing meeting record (matched by id).
    fn update_meeting(&self, meeting: Meeting) -> BoxFuture<'_, ProviderResult<()>>;

    /// Returns the number of stored meetings.
    fn meeting_count(&self) -> BoxFuture<'_, ProviderResult<usize>>;

    /// Appends one entry to the action log.
    fn append_action(&self, action: ActionRecord) -> BoxFuture<'_, ProviderResult<()>>;

    /// Lists action-log entries, newest first, up to `limit`.
    fn list_actions(&self, limit: usize) -> BoxFuture<'_, ProviderResult<Vec<ActionRecord>>>;
}
