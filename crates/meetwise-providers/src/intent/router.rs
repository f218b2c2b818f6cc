//! Hosted-model intent parser.
//!
//! Sends the instruction to an OpenAI-style chat-completions router with a
//! fixed system instruction and parses the model's reply as a
//! [`MeetingIntent`]. A reply that is not clean JSON is surfaced as an
//! invalid-response error carrying the raw text; nothing is guessed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use meetwise_core::MeetingIntent;

use crate::calendar::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::IntentParser;

/// Configuration for the hosted-model parser.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Bearer token for the router.
    pub api_token: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RouterConfig {
    /// Default chat-completions endpoint.
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://router.huggingface.co/v1/chat/completions";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "meta-llama/Llama-3.1-8B-Instruct";

    /// Creates a configuration with defaults for everything but the token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(90),
        }
    }

    /// Builds a configuration from the environment.
    ///
    /// Requires `HUGGINGFACE_API_TOKEN`; honors `HF_MODEL` and `HF_URL`
    /// overrides.
    pub fn from_env() -> ProviderResult<Self> {
        let api_token = std::env::var("HUGGINGFACE_API_TOKEN").map_err(|_| {
            ProviderError::configuration("HUGGINGFACE_API_TOKEN is not set")
        })?;
        let mut config = Self::new(api_token);
        if let Ok(model) = std::env::var("HF_MODEL") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("HF_URL") {
            config.endpoint = url;
        }
        Ok(config)
    }

    /// Builder: set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// The fixed instruction block. Anchored to the request time so relative
/// dates resolve deterministically.
fn system_prompt(now: DateTime<Utc>) -> String {
    format!(
        "You turn natural-language meeting instructions into JSON. \
         Respond with a single JSON object and nothing else.\n\
         When the user wants a meeting created and gives enough information:\n\
         {{\"intent\":\"create\",\"title\":\"...\",\"date\":\"YYYY-MM-DD\",\
         \"start_time\":\"HH:MM\",\"duration_min\":30,\
         \"attendees\":[\"a@example.com\"],\"agenda\":\"...\",\
         \"timezone\":\"Area/City\"}}\n\
         Omit fields the instruction does not determine.\n\
         When the user wants a meeting canceled and names its id:\n\
         {{\"intent\":\"cancel\",\"meeting_id\":\"...\"}}\n\
         When the instruction is not actionable:\n\
         {{\"intent\":\"unclear\",\"reason\":\"what is missing\"}}\n\
         Today is {}.",
        now.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Strips a Markdown code fence when the model wraps its JSON in one.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Intent parser backed by a hosted chat-completions router.
pub struct RouterIntentParser {
    config: RouterConfig,
    http: reqwest::Client,
}

impl RouterIntentParser {
    /// Creates a parser from configuration.
    pub fn new(config: RouterConfig) -> ProviderResult<Self> {
        if config.api_token.is_empty() {
            return Err(ProviderError::configuration("router API token is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    async fn complete(&self, text: &str, now: DateTime<Utc>) -> ProviderResult<MeetingIntent> {
        let prompt = system_prompt(now);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.3,
            max_tokens: 512,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("router request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication("router rejected API token"));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited("router rate limit exceeded"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "router error ({status}): {body}"
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse router response: {e}"))
        })?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();

        debug!(model = %self.config.model, "model reply received");
        parse_intent_reply(content)
    }
}

/// Parses the model's reply into an intent, surfacing unparseable replies.
fn parse_intent_reply(content: &str) -> ProviderResult<MeetingIntent> {
    let json = extract_json(content);
    serde_json::from_str(json).map_err(|e| {
        ProviderError::invalid_response(format!(
            "model reply is not a valid intent ({e}): {content:?}"
        ))
    })
}

impl IntentParser for RouterIntentParser {
    fn name(&self) -> &str {
        "router"
    }

    fn parse(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, ProviderResult<MeetingIntent>> {
        let text = text.to_string();
        Box::pin(async move { self.complete(&text, now).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prompt_is_anchored_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 11, 16, 12, 30, 0).unwrap();
        let prompt = system_prompt(now);
        assert!(prompt.contains("2025-11-16 12:30 UTC"));
        assert!(prompt.contains("\"intent\":\"create\""));
    }

    #[test]
    fn extract_json_passes_plain_objects() {
        assert_eq!(extract_json(r#" {"intent":"cancel"} "#), r#"{"intent":"cancel"}"#);
    }

    #[test]
    fn extract_json_strips_fences() {
        let fenced = "```json\n{\"intent\":\"cancel\",\"meeting_id\":\"m1\"}\n```";
        assert_eq!(
            extract_json(fenced),
            "{\"intent\":\"cancel\",\"meeting_id\":\"m1\"}"
        );
    }

    #[test]
    fn reply_parses_into_intent() {
        let reply = r#"{"intent":"create","title":"Roadmap","date":"2025-11-17",
            "start_time":"16:00","duration_min":45,
            "attendees":["maria@example.com"],"agenda":"roadmap"}"#;
        let intent = parse_intent_reply(reply).unwrap();
        let create = intent.as_create().unwrap();
        assert_eq!(create.title, "Roadmap");
        assert_eq!(create.duration_min, 45);
    }

    #[test]
    fn prose_reply_is_an_error() {
        let err = parse_intent_reply("Sure! I scheduled that for you.").unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::InvalidResponse
        );
        assert!(err.message().contains("scheduled"));
    }

    #[test]
    fn config_from_new_has_defaults() {
        let config = RouterConfig::new("tok");
        assert_eq!(config.endpoint, RouterConfig::DEFAULT_ENDPOINT);
        assert_eq!(config.model, RouterConfig::DEFAULT_MODEL);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(RouterIntentParser::new(RouterConfig::new("")).is_err());
    }
}
