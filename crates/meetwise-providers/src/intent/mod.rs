//! IntentParser trait definition.
//!
//! The intent parser is the collaborator that turns a free-text instruction
//! ("agenda mañana a las 4pm con Maria") into a structured
//! [`MeetingIntent`]. The hosted-model implementation lives in [`router`].

use chrono::{DateTime, Utc};

use meetwise_core::MeetingIntent;

use crate::calendar::BoxFuture;
use crate::error::ProviderResult;

#[cfg(feature = "intent")]
pub mod router;

#[cfg(feature = "intent")]
pub use router::{RouterConfig, RouterIntentParser};

/// The intent-extraction collaborator.
pub trait IntentParser: Send + Sync {
    /// Returns the name of this parser (e.g., "router").
    fn name(&self) -> &str;

    /// Extracts a structured intent from free text.
    ///
    /// `now` anchors relative dates ("mañana", "next Tuesday") to the
    /// request time rather than to any ambient clock.
    fn parse(&self, text: &str, now: DateTime<Utc>)
        -> BoxFuture<'_, ProviderResult<MeetingIntent>>;
}

/// A parser that always returns a fixed intent, with no remote calls.
///
/// Useful in tests and as a stand-in when no model endpoint is configured.
#[derive(Debug, Clone)]
pub struct ScriptedIntentParser {
    intent: MeetingIntent,
}

impl ScriptedIntentParser {
    /// Creates a parser returning `intent` for every input.
    pub fn new(intent: MeetingIntent) -> Self {
        Self { intent }
    }
}

impl IntentParser for ScriptedIntentParser {
    fn name(&self) -> &str {
        "scripted"
    }

    fn parse(
        &self,
        _text: &str,
        _now: DateTime<Utc>,
    ) -> BoxFuture<'_, ProviderResult<MeetingIntent>> {
        let intent = self.intent.clone();
        Box::pin(async move { Ok(intent) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn scripted_parser_returns_its_intent() {
        let parser = ScriptedIntentParser::new(MeetingIntent::Cancel {
            meeting_id: "mtg-7".into(),
        });
        let now = Utc.with_ymd_and_hms(2025, 11, 16, 12, 0, 0).unwrap();

        let intent = parser.parse("cancela la junta mtg-7", now).await.unwrap();
        assert_eq!(
            intent,
            MeetingIntent::Cancel {
                meeting_id: "mtg-7".into()
            }
        );
    }
}
