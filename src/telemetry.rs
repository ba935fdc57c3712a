//! Metric name constants and the registered catalog.
//!
//! Names here are registered without namespace; the store exposes them as
//! `{namespace}_{name}` (default namespace `chatbot`, so
//! `chatbot_chat_messages_total{sender="user"}`). The store accepts either
//! form on lookup.
//!
//! # Metric naming conventions
//!
//! Counters end in `_total` (except the response-time `_sum`/`_count` pair
//! and `chat_sentiment_counts`), averages end in `_avg`, maxima in `_max`.
//!
//! # Common labels
//!
//! - `sender`: "user" or "bot"
//! - `type`: sentiment bucket, one of "negative", "neutral", "positive"
//! - `model`: LLM or embedder name as reported by the host
//! - `source`: clustered retrieval source (see [`cluster_source`](crate::cluster_source))
//! - `collection`: vector memory collection

use metrics::Unit;

use crate::store::MetricDescriptor;

/// Messages seen. Labels: `sender`.
pub const MESSAGES_TOTAL: &str = "chat_messages_total";

/// User messages per browser language. Labels: `lang`.
pub const MESSAGES_BY_LANGUAGE_TOTAL: &str = "chat_messages_by_language_total";

/// Sentiment polarity distribution. Labels: `sender`.
pub const SENTIMENT_SCORE: &str = "chat_sentiment_score";

/// Sentiment bucket counts. Labels: `sender`, `type`.
pub const SENTIMENT_COUNTS: &str = "chat_sentiment_counts";

/// New chat sessions.
pub const SESSIONS_TOTAL: &str = "chat_sessions_total";

/// Mean messages per session.
pub const MESSAGES_PER_CHAT_AVG: &str = "chat_messages_per_chat_avg";

/// Most messages in any single session.
pub const MESSAGES_PER_CHAT_MAX: &str = "chat_messages_per_chat_max";

/// Documents recalled from declarative memory. Labels: `source`.
pub const RAG_DOCUMENTS_RETRIEVED_TOTAL: &str = "rag_documents_retrieved_total";

/// Replies answered with the fallback "no relevant memory" message.
pub const NO_RELEVANT_MEMORY_TOTAL: &str = "chat_no_relevant_memory_total";

/// LLM prompt tokens. Labels: `model`.
pub const LLM_INPUT_TOKENS_TOTAL: &str = "llm_input_tokens_total";

/// LLM completion tokens. Labels: `model`.
pub const LLM_OUTPUT_TOKENS_TOTAL: &str = "llm_output_tokens_total";

/// Completed LLM interactions. Labels: `model`.
pub const LLM_INTERACTIONS_TOTAL: &str = "llm_interactions_total";

/// Mean prompt tokens per interaction. Labels: `model`.
pub const LLM_INPUT_TOKENS_AVG: &str = "llm_input_tokens_avg";

/// Mean completion tokens per interaction. Labels: `model`.
pub const LLM_OUTPUT_TOKENS_AVG: &str = "llm_output_tokens_avg";

/// Tokens sent to the embedder. Labels: `model`.
pub const EMBEDDING_TOKENS_TOTAL: &str = "embedding_tokens_total";

/// Sum of accounted response times.
pub const RESPONSE_TIME_SECONDS_SUM: &str = "chat_response_time_seconds_sum";

/// Number of accounted responses.
pub const RESPONSE_TIME_SECONDS_COUNT: &str = "chat_response_time_seconds_count";

/// Slowest accounted response.
pub const RESPONSE_TIME_SECONDS_MAX: &str = "chat_response_time_seconds_max";

/// Thumbs-up feedback.
pub const FEEDBACK_THUMB_UP_TOTAL: &str = "feedback_thumb_up_total";

/// Thumbs-down feedback.
pub const FEEDBACK_THUMB_DOWN_TOTAL: &str = "feedback_thumb_down_total";

/// Host version info, always 1. Labels: `core_version`, `frontend_version`.
pub const INSTANCE_INFO: &str = "instance_info";

/// Plugin version info, always 1. Labels: `plugin_id`, `version`.
pub const PLUGIN_INFO: &str = "plugin_info";

/// Points stored in vector memory. Labels: `collection`.
pub const VECTOR_MEMORY_POINTS_TOTAL: &str = "vector_memory_points_total";

/// Distinct sources stored in vector memory. Labels: `collection`.
pub const VECTOR_MEMORY_SOURCES_TOTAL: &str = "vector_memory_sources_total";

/// Bucket bounds for polarity scores in `[-1, 1]`: very negative through
/// very positive, with the neutral band `[-0.05, 0.05]` as its own bucket.
pub const SENTIMENT_BUCKETS: &[f64] = &[-1.0, -0.6, -0.2, -0.05, 0.05, 0.2, 0.6, 1.0];

/// Every metric family the engine records into.
///
/// `max_source_series` caps the `source` label of
/// [`RAG_DOCUMENTS_RETRIEVED_TOTAL`]; `None` leaves it unbounded.
pub fn catalog(max_source_series: Option<usize>) -> Vec<MetricDescriptor> {
    vec![
        MetricDescriptor::counter(MESSAGES_TOTAL, "Total number of messages").labels(&["sender"]),
        MetricDescriptor::counter(
            MESSAGES_BY_LANGUAGE_TOTAL,
            "Total number of user messages by browser language",
        )
        .labels(&["lang"]),
        MetricDescriptor::histogram(
            SENTIMENT_SCORE,
            "Sentiment polarity score of messages",
            SENTIMENT_BUCKETS,
        )
        .labels(&["sender"]),
        MetricDescriptor::counter(
            SENTIMENT_COUNTS,
            "Sentiment counts (negative, neutral, positive)",
        )
        .labels(&["sender", "type"]),
        MetricDescriptor::counter(SESSIONS_TOTAL, "Total number of new chat sessions"),
        MetricDescriptor::gauge(MESSAGES_PER_CHAT_AVG, "Average number of messages per chat"),
        MetricDescriptor::gauge(
            MESSAGES_PER_CHAT_MAX,
            "Maximum number of messages in a single chat",
        ),
        MetricDescriptor::counter(
            RAG_DOCUMENTS_RETRIEVED_TOTAL,
            "Total number of documents retrieved from RAG",
        )
        .labels(&["source"])
        .max_series(max_source_series),
        MetricDescriptor::counter(
            NO_RELEVANT_MEMORY_TOTAL,
            "Total number of times no relevant memory was found",
        ),
        MetricDescriptor::counter(LLM_INPUT_TOKENS_TOTAL, "Total input tokens").labels(&["model"]),
        MetricDescriptor::counter(LLM_OUTPUT_TOKENS_TOTAL, "Total output tokens")
            .labels(&["model"]),
        MetricDescriptor::counter(LLM_INTERACTIONS_TOTAL, "Total completed LLM interactions")
            .labels(&["model"]),
        MetricDescriptor::gauge(LLM_INPUT_TOKENS_AVG, "Average input tokens").labels(&["model"]),
        MetricDescriptor::gauge(LLM_OUTPUT_TOKENS_AVG, "Average output tokens").labels(&["model"]),
        MetricDescriptor::counter(EMBEDDING_TOKENS_TOTAL, "Total tokens used for embeddings")
            .labels(&["model"]),
        MetricDescriptor::counter(
            RESPONSE_TIME_SECONDS_SUM,
            "Sum of response times in seconds",
        )
        .unit(Unit::Seconds),
        MetricDescriptor::counter(
            RESPONSE_TIME_SECONDS_COUNT,
            "Count of responses for average time calculation",
        ),
        MetricDescriptor::gauge(
            RESPONSE_TIME_SECONDS_MAX,
            "Maximum response time in seconds",
        )
        .unit(Unit::Seconds),
        MetricDescriptor::counter(FEEDBACK_THUMB_UP_TOTAL, "Total thumbs-up feedback"),
        MetricDescriptor::counter(FEEDBACK_THUMB_DOWN_TOTAL, "Total thumbs-down feedback"),
        MetricDescriptor::gauge(
            INSTANCE_INFO,
            "Global version information (Core and Frontend)",
        )
        .labels(&["core_version", "frontend_version"]),
        MetricDescriptor::gauge(PLUGIN_INFO, "Plugin version information")
            .labels(&["plugin_id", "version"]),
        MetricDescriptor::gauge(
            VECTOR_MEMORY_POINTS_TOTAL,
            "Total number of points in vector memory",
        )
        .labels(&["collection"]),
        MetricDescriptor::gauge(
            VECTOR_MEMORY_SOURCES_TOTAL,
            "Total number of unique sources in vector memory",
        )
        .labels(&["collection"]),
    ]
}
