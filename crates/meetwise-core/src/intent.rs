//! Structured meeting-action intents.
//!
//! [`MeetingIntent`] is the JSON contract between the hosted language model
//! and the rest of the system: free text goes in, one of these comes back.
//! The parser lives in the providers crate; this module only defines the
//! shape and the conversion into a [`MeetingDraft`].

use serde::{Deserialize, Serialize};

use crate::meeting::MeetingDraft;

fn default_intent_duration() -> u32 {
    30
}

/// Details of a create-meeting instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIntent {
    /// Meeting title extracted from the instruction.
    pub title: String,

    /// Date as `YYYY-MM-DD`, when the instruction names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Start time as `HH:MM`, when the instruction names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Duration in minutes.
    #[serde(default = "default_intent_duration")]
    pub duration_min: u32,

    /// Attendee emails mentioned in the instruction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,

    /// Agenda text, when present.
    #[serde(default)]
    pub agenda: String,

    /// Timezone, when the instruction names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl CreateIntent {
    /// Converts the intent into a draft, filling a missing timezone with the
    /// caller's default.
    pub fn into_draft(self, default_timezone: &str) -> MeetingDraft {
        let timezone = self
            .timezone
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| default_timezone.to_string());
        MeetingDraft {
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            duration_min: self.duration_min,
            attendees: self.attendees,
            agenda: self.agenda,
            timezone,
        }
    }
}

/// A structured meeting action extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum MeetingIntent {
    /// The user wants a meeting created.
    Create(CreateIntent),

    /// The user wants an existing meeting canceled.
    Cancel {
        /// Identifier of the meeting to cancel.
        meeting_id: String,
    },

    /// The instruction was not actionable.
    Unclear {
        /// What was missing or ambiguous.
        reason: String,
    },
}

impl MeetingIntent {
    /// Returns the create details, if this is a create intent.
    pub fn as_create(&self) -> Option<&CreateIntent> {
        match self {
            Self::Create(details) => Some(details),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_intent_deserializes() {
        let json = r#"{
            "intent": "create",
            "title": "Roadmap de IA",
            "date": "2025-11-17",
            "start_time": "16:00",
            "duration_min": 45,
            "attendees": ["maria@example.com", "hector@example.com"],
            "agenda": "roadmap"
        }"#;
        let intent: MeetingIntent = serde_json::from_str(json).unwrap();
        let create = intent.as_create().unwrap();
        assert_eq!(create.title, "Roadmap de IA");
        assert_eq!(create.attendees.len(), 2);
        assert_eq!(create.duration_min, 45);
        assert!(create.timezone.is_none());
    }

    #[test]
    fn cancel_intent_deserializes() {
        let intent: MeetingIntent =
            serde_json::from_str(r#"{"intent":"cancel","meeting_id":"mtg-42"}"#).unwrap();
        assert_eq!(
            intent,
            MeetingIntent::Cancel {
                meeting_id: "mtg-42".into()
            }
        );
    }

    #[test]
    fn unclear_intent_deserializes() {
        let intent: MeetingIntent =
            serde_json::from_str(r#"{"intent":"unclear","reason":"no date given"}"#).unwrap();
        assert!(matches!(intent, MeetingIntent::Unclear { .. }));
    }

    #[test]
    fn into_draft_fills_default_timezone() {
        let create = CreateIntent {
            title: "Sync".into(),
            date: Some("2025-11-17".into()),
            start_time: Some("10:00".into()),
            duration_min: 30,
            attendees: vec![],
            agenda: String::new(),
            timezone: None,
        };
        let draft = create.into_draft("America/Mexico_City");
        assert_eq!(draft.timezone, "America/Mexico_City");
        assert_eq!(draft.date.as_deref(), Some("2025-11-17"));
    }

    #[test]
    fn into_draft_keeps_explicit_timezone() {
        let create = CreateIntent {
            title: "Sync".into(),
            date: None,
            start_time: None,
            duration_min: 30,
            attendees: vec![],
            agenda: String::new(),
            timezone: Some("Europe/Paris".into()),
        };
        assert_eq!(create.into_draft("UTC").timezone, "Europe/Paris");
    }

    #[test]
    fn duration_defaults_when_absent() {
        let intent: MeetingIntent =
            serde_json::from_str(r#"{"intent":"create","title":"Sync"}"#).unwrap();
        assert_eq!(intent.as_create().unwrap().duration_min, 30);
    }
}
