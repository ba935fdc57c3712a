//! The event ingestion facade.
//!
//! [`ChatAnalytics`] is the single entry point for the host's hooks. Each
//! handler validates its payload, calls only the components relevant to
//! the event, and converts every component failure into a diagnostic
//! record. Handlers never return errors, except feedback, whose
//! authentication outcome is the caller's response.

mod builder;

use std::sync::Arc;

use serde_json::json;

pub use builder::{ChatAnalyticsBuilder, PLUGIN_ID};

use crate::config::MetricsConfig;
use crate::diagnostics;
use crate::events::{
    BotReply, ChatEvent, EmbeddingConsumed, FeedbackReceived, MemoryRetrieved, SessionStarted,
    TokensConsumed, UserMessage,
};
use crate::feedback::{self, FeedbackBody, FeedbackValidator, FeedbackVote};
use crate::sentiment::{LazyScorer, Sender, SentimentClassifier};
use crate::session::SessionTracker;
use crate::source::cluster_optional_source;
use crate::store::{MetricStore, MetricsSnapshot};
use crate::telemetry;
use crate::usage::{ResponseTimeTracker, TokenTracker};
use crate::{AuthError, Result};

/// Chat analytics engine.
///
/// Construct once at startup and share by reference (or `Arc`) with every
/// hook. All handlers take `&self` and are safe to call concurrently.
pub struct ChatAnalytics {
    store: Arc<MetricStore>,
    metrics: MetricsConfig,
    sessions: SessionTracker,
    sentiment: Option<SentimentClassifier>,
    lazy_scorer: Option<Arc<LazyScorer>>,
    tokens: TokenTracker,
    response_times: ResponseTimeTracker,
    feedback: Option<FeedbackValidator>,
}

impl std::fmt::Debug for ChatAnalytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAnalytics")
            .field("store", &self.store)
            .field("metrics", &self.metrics)
            .field(
                "scorer",
                &self.sentiment.as_ref().map(|s| s.scorer().name().to_string()),
            )
            .field("feedback", &self.feedback.is_some())
            .finish_non_exhaustive()
    }
}

impl ChatAnalytics {
    pub fn builder() -> ChatAnalyticsBuilder {
        ChatAnalyticsBuilder::new()
    }

    /// The underlying metric store.
    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Point-in-time view of every registered metric.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.store.snapshot()
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn tokens(&self) -> &TokenTracker {
        &self.tokens
    }

    pub fn response_times(&self) -> &ResponseTimeTracker {
        &self.response_times
    }

    /// Load the sentiment model now instead of on the first message.
    ///
    /// Returns whether a scorer is ready. Without a lazy loader this only
    /// reports whether a scorer was configured.
    pub async fn warm_up(&self) -> bool {
        match &self.lazy_scorer {
            Some(lazy) => lazy.warm_up().await,
            None => self.sentiment.is_some(),
        }
    }

    /// A user message arrived.
    ///
    /// Counts the message and its browser language and advances the session
    /// when message metrics are enabled, then scores the text. The scorer is awaited with no store lock held.
    pub async fn on_user_message(&self, event: &UserMessage) {
        if self.metrics.enable_message_metrics {
            isolate(
                "message_tracking_error",
                self.store.inc(
                    telemetry::MESSAGES_TOTAL,
                    &[("sender", Sender::User.as_str())],
                ),
            );
            if let Some(lang) = event.browser_lang.as_deref().and_then(primary_language) {
                isolate(
                    "message_tracking_error",
                    self.store
                        .inc(telemetry::MESSAGES_BY_LANGUAGE_TOTAL, &[("lang", lang.as_str())]),
                );
            }
            isolate(
                "session_tracking_error",
                self.sessions.record_message(&event.session_id),
            );
        }

        if !self.metrics.enable_sentiment_metrics || event.text.trim().is_empty() {
            return;
        }
        if let Some(classifier) = &self.sentiment {
            isolate(
                "sentiment_analysis_error",
                classifier.classify(Sender::User, &event.text).await,
            );
        }
    }

    /// The bot sent a reply.
    ///
    /// Default replies count as "no relevant memory" and are left out of
    /// response-time accounting.
    pub fn on_bot_reply(&self, event: &BotReply) {
        if self.metrics.enable_message_metrics {
            isolate(
                "message_tracking_error",
                self.store.inc(
                    telemetry::MESSAGES_TOTAL,
                    &[("sender", Sender::Bot.as_str())],
                ),
            );
        }
        if event.is_default {
            isolate(
                "rag_metrics_error",
                self.store.inc(telemetry::NO_RELEVANT_MEMORY_TOTAL, &[]),
            );
        }
        isolate(
            "response_time_error",
            self.response_times
                .record(event.elapsed_seconds, event.is_default),
        );
    }

    /// A document was recalled from memory; counted under its cluster key.
    pub fn on_memory_retrieved(&self, event: &MemoryRetrieved) {
        if !self.metrics.enable_rag_metrics {
            return;
        }
        let source = cluster_optional_source(event.source.as_deref());
        isolate(
            "rag_metrics_error",
            self.store
                .inc(telemetry::RAG_DOCUMENTS_RETRIEVED_TOTAL, &[("source", source.as_str())]),
        );
    }

    pub fn on_tokens_consumed(&self, event: &TokensConsumed) {
        isolate(
            "token_tracking_error",
            self.tokens
                .record_interaction(&event.model, event.input_tokens, event.output_tokens),
        );
    }

    pub fn on_embedding_consumed(&self, event: &EmbeddingConsumed) {
        isolate(
            "embedding_token_tracking_error",
            self.tokens.record_embedding(&event.model, event.tokens),
        );
    }

    /// A session opened. Known sessions are left unchanged.
    pub fn on_session_started(&self, event: &SessionStarted) {
        if !self.metrics.enable_message_metrics {
            return;
        }
        isolate(
            "session_tracking_error",
            self.sessions.register(&event.session_id),
        );
    }

    /// A feedback request with a raw `Authorization` header.
    pub fn on_feedback(
        &self,
        event: &FeedbackReceived,
    ) -> std::result::Result<FeedbackVote, AuthError> {
        let token = feedback::bearer_token(event.authorization.as_deref()).inspect_err(reject)?;
        self.record_feedback(token, event.value)
    }

    /// Verify `bearer_token` and count the vote.
    ///
    /// Rejections are logged as `feedback_rejected` and returned; nothing
    /// is counted for a rejected request.
    pub fn record_feedback(
        &self,
        bearer_token: &str,
        value: Option<bool>,
    ) -> std::result::Result<FeedbackVote, AuthError> {
        let validator = self.feedback.as_ref().ok_or(AuthError::NotConfigured);
        let session_id = validator
            .and_then(|v| v.validate(bearer_token))
            .inspect_err(reject)?;

        let vote = FeedbackBody { value }.vote();
        let metric = match vote {
            FeedbackVote::Up => telemetry::FEEDBACK_THUMB_UP_TOTAL,
            FeedbackVote::Down => telemetry::FEEDBACK_THUMB_DOWN_TOTAL,
        };
        isolate("feedback_tracking_error", self.store.inc(metric, &[]));
        tracing::debug!(session_id = %session_id, ?vote, "feedback recorded");
        Ok(vote)
    }

    /// Route a serialized event to its handler.
    ///
    /// Only a rejected feedback request produces an error.
    pub async fn dispatch(&self, event: &ChatEvent) -> std::result::Result<(), AuthError> {
        match event {
            ChatEvent::UserMessage(e) => self.on_user_message(e).await,
            ChatEvent::BotReply(e) => self.on_bot_reply(e),
            ChatEvent::MemoryRetrieved(e) => self.on_memory_retrieved(e),
            ChatEvent::TokensConsumed(e) => self.on_tokens_consumed(e),
            ChatEvent::EmbeddingConsumed(e) => self.on_embedding_consumed(e),
            ChatEvent::SessionStarted(e) => self.on_session_started(e),
            ChatEvent::FeedbackReceived(e) => {
                self.on_feedback(e)?;
            }
        }
        Ok(())
    }

    /// Publish the host's core and frontend versions.
    pub fn record_instance_info(&self, core_version: &str, frontend_version: &str) -> Result<()> {
        self.store.set(
            telemetry::INSTANCE_INFO,
            &[
                ("core_version", core_version),
                ("frontend_version", frontend_version),
            ],
            1.0,
        )
    }

    /// Publish a plugin's version.
    pub fn record_plugin_info(&self, plugin_id: &str, version: &str) -> Result<()> {
        self.store.set(
            telemetry::PLUGIN_INFO,
            &[("plugin_id", plugin_id), ("version", version)],
            1.0,
        )
    }

    /// Publish the size of one vector memory collection.
    pub fn record_vector_memory(&self, collection: &str, points: u64, sources: u64) -> Result<()> {
        let labels = [("collection", collection)];
        self.store
            .set(telemetry::VECTOR_MEMORY_POINTS_TOTAL, &labels, points as f64)?;
        self.store
            .set(telemetry::VECTOR_MEMORY_SOURCES_TOTAL, &labels, sources as f64)
    }
}

fn isolate<T>(event: &str, result: Result<T>) -> Option<T> {
    result.inspect_err(|e| diagnostics::failure(event, e)).ok()
}

fn reject(err: &AuthError) {
    diagnostics::warn("feedback_rejected", json!({ "reason": err.to_string() }));
}

/// Primary subtag of a language tag, lower-cased: `"it-IT"` becomes `"it"`.
fn primary_language(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next()?.trim();
    if primary.is_empty() || !primary.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(primary.to_ascii_lowercase())
}
