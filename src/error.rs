//! chat-analytics error types

/// Errors from the aggregation engine.
///
/// Recording paths return these internally; the
/// [`ChatAnalytics`](crate::ChatAnalytics) facade converts them into
/// diagnostic records instead of handing them to the host. Only
/// [`AuthError`] on the feedback path reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    // Scoring dependency errors
    #[error("sentiment scorer unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("sentiment scoring failed: {0}")]
    ScoringFailure(String),

    #[error("I/O error: {0}")]
    TransientIo(String),

    // Feedback path
    #[error("feedback rejected: {0}")]
    Auth(#[from] AuthError),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Structural store errors
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("metric '{name}' is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("metric '{name}' expects labels {expected:?}")]
    LabelMismatch { name: String, expected: Vec<String> },

    #[error("invalid value {value} for metric '{name}'")]
    InvalidValue { name: String, value: f64 },

    // Event payload errors
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Diagnostic event name for this error, used in the `event` log field.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::DependencyUnavailable(_) => "model_unavailable",
            Self::ScoringFailure(_) => "sentiment_analysis_error",
            Self::TransientIo(_) => "model_load_timeout",
            Self::Auth(_) => "feedback_rejected",
            Self::Configuration(_) => "configuration_error",
            Self::UnknownMetric(_)
            | Self::KindMismatch { .. }
            | Self::LabelMismatch { .. }
            | Self::InvalidValue { .. } => "metric_update_error",
            Self::InvalidEvent(_) | Self::Json(_) => "invalid_event",
        }
    }
}

/// Feedback token rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    /// Malformed token, unsupported algorithm, or signature mismatch.
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("subject '{subject}' does not start with '{prefix}'")]
    PrefixMismatch { subject: String, prefix: String },

    /// No feedback secret configured; every token is refused.
    #[error("feedback validation is not configured")]
    NotConfigured,
}

/// Result type alias for chat-analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;
