//! Inbound Events API payload model and prompt extraction.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// Mention prefix pattern: captures the prompt following `<@USERID>`.
const MENTION_PATTERN: &str = r"<@\w+>\s*(.+)";

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)] // the pattern is a compile-time literal
fn mention_re() -> &'static Regex {
    MENTION_RE.get_or_init(|| Regex::new(MENTION_PATTERN).expect("valid mention pattern"))
}

/// Raw message event record inside an event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessageEvent {
    /// Event type (e.g. `app_mention`, `message`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Message text, possibly carrying a mention prefix.
    #[serde(default)]
    pub text: Option<String>,
    /// Sender user ID.
    #[serde(default)]
    pub user: Option<String>,
    /// Originating channel ID.
    #[serde(default)]
    pub channel: Option<String>,
    /// Client-generated message identifier, the dedup key.
    #[serde(default)]
    pub client_msg_id: Option<String>,
}

/// Top-level request body: either a handshake or an event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Payload type (`url_verification` for handshakes).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Challenge token carried by a handshake.
    #[serde(default)]
    pub challenge: Option<String>,
    /// Message event record.
    #[serde(default)]
    pub event: Option<RawMessageEvent>,
}

/// A message event with every field the pipeline needs present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender user ID.
    pub user: String,
    /// Originating channel ID.
    pub channel: String,
    /// Raw message text.
    pub text: String,
    /// Client-generated message identifier, the dedup key.
    pub client_msg_id: String,
}

/// Classified inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// URL verification handshake carrying a challenge token to echo.
    Handshake {
        /// Challenge token to return verbatim.
        challenge: String,
    },
    /// A message event eligible for fulfillment.
    Message(InboundMessage),
    /// Authentic but unusable traffic (unparseable body, missing fields,
    /// events without a `client_msg_id` such as bot posts or edits).
    Other,
}

impl InboundEvent {
    /// Classify a raw request body.
    ///
    /// Never fails: anything that is not a handshake or a complete message
    /// event is [`InboundEvent::Other`].
    #[must_use]
    pub fn from_slice(body: &[u8]) -> Self {
        let Ok(envelope) = serde_json::from_slice::<Envelope>(body) else {
            return Self::Other;
        };

        if envelope.kind.as_deref() == Some("url_verification") {
            if let Some(challenge) = envelope.challenge {
                return Self::Handshake { challenge };
            }
            return Self::Other;
        }

        let Some(event) = envelope.event else {
            return Self::Other;
        };
        match (event.user, event.channel, event.text, event.client_msg_id) {
            (Some(user), Some(channel), Some(text), Some(client_msg_id)) => {
                Self::Message(InboundMessage {
                    user,
                    channel,
                    text,
                    client_msg_id,
                })
            }
            _ => Self::Other,
        }
    }
}

/// Extract the prompt from message text.
///
/// Strips everything up to and including the first `<@MENTION>` prefix;
/// text without a mention is returned verbatim.
#[must_use]
pub fn extract_prompt(text: &str) -> &str {
    match mention_re().captures(text).and_then(|caps| caps.get(1)) {
        Some(prompt) => prompt.as_str(),
        None => text,
    }
}
