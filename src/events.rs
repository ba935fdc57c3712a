//! Typed event payloads delivered by the host's hooks.
//!
//! [`ChatEvent`] is the serialized form used by the replay tool: one JSON
//! object per line, tagged by `kind`.
//!
//! ```rust
//! # use chat_analytics::events::ChatEvent;
//! let event: ChatEvent = serde_json::from_str(
//!     r#"{"kind": "tokens_consumed", "model": "gpt-4o", "input_tokens": 10, "output_tokens": 5}"#,
//! ).unwrap();
//! assert_eq!(event.kind(), "tokens_consumed");
//! ```

use serde::{Deserialize, Serialize};

/// A user message arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    pub session_id: String,
    /// Browser `Accept-Language` style tag such as `"it-IT"`.
    #[serde(default)]
    pub browser_lang: Option<String>,
}

impl UserMessage {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            browser_lang: None,
        }
    }

    pub fn browser_lang(mut self, lang: impl Into<String>) -> Self {
        self.browser_lang = Some(lang.into());
        self
    }
}

/// The bot sent a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotReply {
    pub elapsed_seconds: f64,
    /// The reply was the fallback answer given when no relevant memory was
    /// found. Such replies are excluded from latency accounting.
    #[serde(default)]
    pub is_default: bool,
}

impl BotReply {
    pub fn new(elapsed_seconds: f64) -> Self {
        Self {
            elapsed_seconds,
            is_default: false,
        }
    }

    pub fn default_reply(elapsed_seconds: f64) -> Self {
        Self {
            elapsed_seconds,
            is_default: true,
        }
    }
}

/// A document was recalled from declarative memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRetrieved {
    #[serde(default)]
    pub source: Option<String>,
}

impl MemoryRetrieved {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }
}

/// One completed LLM interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensConsumed {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Tokens sent to the embedder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConsumed {
    pub model: String,
    pub tokens: u64,
}

/// A chat session opened before any message was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: String,
}

/// A thumbs-up/down request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceived {
    /// Raw `Authorization` header value, `Bearer <token>`.
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub value: Option<bool>,
}

impl FeedbackReceived {
    pub fn new(authorization: impl Into<String>, value: Option<bool>) -> Self {
        Self {
            authorization: Some(authorization.into()),
            value,
        }
    }
}

/// Any event the engine ingests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatEvent {
    UserMessage(UserMessage),
    BotReply(BotReply),
    MemoryRetrieved(MemoryRetrieved),
    TokensConsumed(TokensConsumed),
    EmbeddingConsumed(EmbeddingConsumed),
    SessionStarted(SessionStarted),
    FeedbackReceived(FeedbackReceived),
}

impl ChatEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserMessage(_) => "user_message",
            Self::BotReply(_) => "bot_reply",
            Self::MemoryRetrieved(_) => "memory_retrieved",
            Self::TokensConsumed(_) => "tokens_consumed",
            Self::EmbeddingConsumed(_) => "embedding_consumed",
            Self::SessionStarted(_) => "session_started",
            Self::FeedbackReceived(_) => "feedback_received",
        }
    }
}
