//! Append-only action log entries.
//!
//! Every mutation of a meeting (create, cancel) is recorded as an
//! [`ActionRecord`] attributed to the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A meeting was created.
    Create,
    /// A meeting was canceled.
    Cancel,
    /// A meeting was moved to a new date/time.
    Reschedule,
}

impl ActionKind {
    /// Stable lowercase name, as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Cancel => "cancel",
            Self::Reschedule => "reschedule",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Store-assigned identifier.
    pub id: String,
    /// What happened.
    pub kind: ActionKind,
    /// Identifier of the affected resource (meeting id).
    pub subject_id: String,
    /// Email of the user the action is attributed to.
    pub user: String,
    /// When the action happened.
    pub date: DateTime<Utc>,
}

impl ActionRecord {
    /// Creates a new record.
    pub fn new(
        id: impl Into<String>,
        kind: ActionKind,
        subject_id: impl Into<String>,
        user: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            subject_id: subject_id.into(),
            user: user.into(),
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kind_names() {
        assert_eq!(ActionKind::Create.as_str(), "create");
        assert_eq!(ActionKind::Cancel.to_string(), "cancel");
    }

    #[test]
    fn serde_roundtrip() {
        let record = ActionRecord::new(
            "act-1",
            ActionKind::Create,
            "mtg-1",
            "maria@example.com",
            Utc.with_ymd_and_hms(2025, 11, 16, 12, 0, 0).unwrap(),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"create\""));
        let parsed: ActionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
