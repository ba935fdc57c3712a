//! Engine configuration.
//!
//! Every field has a default, so an empty document is a valid
//! configuration. The host decides where the file lives and hands over
//! either a path or the TOML text:
//!
//! ```toml
//! [metrics]
//! namespace = "chatbot"
//! enable_sentiment_metrics = true
//! max_source_series = 500
//!
//! [sentiment]
//! max_text_chars = 2000
//! score_timeout_ms = 5000
//!
//! [sentiment.cache]
//! max_entries = 10000
//!
//! [feedback]
//! secret = "jwt-secret"
//! session_prefix = "user_"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::feedback::FeedbackValidator;
use crate::sentiment::ScoreCacheConfig;
use crate::{AnalyticsError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub feedback: Option<FeedbackConfig>,
}

impl AnalyticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to parse configuration: {e}"))
        })
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentConfig) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

/// Which metric groups are recorded, and how they are exposed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Count messages by sender and browser language, and track sessions
    /// and conversation depth (default: true).
    #[serde(default = "default_true")]
    pub enable_message_metrics: bool,
    /// Score user messages (default: true).
    #[serde(default = "default_true")]
    pub enable_sentiment_metrics: bool,
    /// Count retrieved documents by source (default: true).
    #[serde(default = "default_true")]
    pub enable_rag_metrics: bool,
    /// Prefix for every exposed metric name (default: "chatbot").
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Cap on distinct `source` series; unbounded when unset.
    #[serde(default)]
    pub max_source_series: Option<usize>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_message_metrics: true,
            enable_sentiment_metrics: true,
            enable_rag_metrics: true,
            namespace: default_namespace(),
            max_source_series: None,
        }
    }
}

impl MetricsConfig {
    pub fn message_metrics(mut self, enabled: bool) -> Self {
        self.enable_message_metrics = enabled;
        self
    }

    pub fn sentiment_metrics(mut self, enabled: bool) -> Self {
        self.enable_sentiment_metrics = enabled;
        self
    }

    pub fn rag_metrics(mut self, enabled: bool) -> Self {
        self.enable_rag_metrics = enabled;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn max_source_series(mut self, limit: usize) -> Self {
        self.max_source_series = Some(limit);
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    "chatbot".to_string()
}

/// Sentiment scoring limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentConfig {
    /// Characters of a message passed to the scorer (default: 2000).
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Per-message scoring timeout in milliseconds (default: 5000).
    #[serde(default = "default_score_timeout_ms")]
    pub score_timeout_ms: u64,
    /// Model load/download timeout in seconds (default: 300).
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    /// Memoise scores for identical text. Disabled when unset.
    #[serde(default)]
    pub cache: Option<ScoreCacheConfig>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            score_timeout_ms: default_score_timeout_ms(),
            load_timeout_secs: default_load_timeout_secs(),
            cache: None,
        }
    }
}

impl SentimentConfig {
    pub fn max_text_chars(mut self, chars: usize) -> Self {
        self.max_text_chars = chars;
        self
    }

    pub fn score_timeout(mut self, timeout: Duration) -> Self {
        self.score_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_secs = timeout.as_secs();
        self
    }

    pub fn cache(mut self, cache: ScoreCacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn score_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.score_timeout_ms)
    }

    pub fn load_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

fn default_max_text_chars() -> usize {
    2000
}

fn default_score_timeout_ms() -> u64 {
    5000
}

fn default_load_timeout_secs() -> u64 {
    300
}

/// Feedback token verification settings.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackConfig {
    /// HS256 secret shared with the host's token issuer.
    #[serde(default)]
    pub secret: String,
    /// Required prefix of the token subject.
    #[serde(default)]
    pub session_prefix: String,
}

impl std::fmt::Debug for FeedbackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackConfig")
            .field("secret", &"<redacted>")
            .field("session_prefix", &self.session_prefix)
            .finish()
    }
}

impl FeedbackConfig {
    pub fn new(secret: impl Into<String>, session_prefix: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session_prefix: session_prefix.into(),
        }
    }

    pub fn validator(&self) -> FeedbackValidator {
        FeedbackValidator::new(self.secret.as_bytes(), self.session_prefix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AnalyticsConfig::from_toml_str("").unwrap();
        assert!(config.metrics.enable_message_metrics);
        assert!(config.metrics.enable_sentiment_metrics);
        assert!(config.metrics.enable_rag_metrics);
        assert_eq!(config.metrics.namespace, "chatbot");
        assert_eq!(config.metrics.max_source_series, None);
        assert_eq!(config.sentiment.max_text_chars, 2000);
        assert_eq!(config.sentiment.score_timeout_ms, 5000);
        assert_eq!(config.sentiment.load_timeout_secs, 300);
        assert!(config.sentiment.cache.is_none());
        assert!(config.feedback.is_none());
    }

    #[test]
    fn parses_full_document() {
        let toml = r#"
            [metrics]
            enable_rag_metrics = false
            namespace = "bot"
            max_source_series = 50

            [sentiment]
            max_text_chars = 512
            score_timeout_ms = 250

            [sentiment.cache]
            max_entries = 100

            [feedback]
            secret = "s3cret"
            session_prefix = "user_"
        "#;
        let config = AnalyticsConfig::from_toml_str(toml).unwrap();
        assert!(!config.metrics.enable_rag_metrics);
        assert!(config.metrics.enable_message_metrics);
        assert_eq!(config.metrics.namespace, "bot");
        assert_eq!(config.metrics.max_source_series, Some(50));
        assert_eq!(config.sentiment.max_text_chars, 512);
        assert_eq!(
            config.sentiment.score_timeout_duration(),
            Duration::from_millis(250)
        );
        let cache = config.sentiment.cache.unwrap();
        assert_eq!(cache.max_entries, 100);
        assert_eq!(cache.ttl_secs, 3600);
        let feedback = config.feedback.unwrap();
        assert_eq!(feedback.secret, "s3cret");
        assert_eq!(feedback.session_prefix, "user_");
    }

    #[test]
    fn oversized_score_timeout_saturates() {
        let config = SentimentConfig::default().score_timeout(Duration::MAX);
        assert_eq!(config.score_timeout_ms, u64::MAX);
        let config = SentimentConfig::default().score_timeout(Duration::from_millis(750));
        assert_eq!(config.score_timeout_ms, 750);
    }

    #[test]
    fn unknown_keys_are_configuration_errors() {
        let err = AnalyticsConfig::from_toml_str("[metrics]\nenable_everything = true").unwrap_err();
        assert!(matches!(err, AnalyticsError::Configuration(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[metrics]\nnamespace = \"from_file\"").unwrap();
        let config = AnalyticsConfig::load(file.path()).unwrap();
        assert_eq!(config.metrics.namespace, "from_file");
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalyticsConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AnalyticsError::Configuration(_)));
    }

    #[test]
    fn feedback_debug_redacts_secret() {
        let config = FeedbackConfig::new("hunter2", "user_");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn builder_setters() {
        let config = AnalyticsConfig::new()
            .with_metrics(MetricsConfig::default().rag_metrics(false).max_source_series(10))
            .with_sentiment(SentimentConfig::default().score_timeout(Duration::from_secs(1)));
        assert!(!config.metrics.enable_rag_metrics);
        assert_eq!(config.metrics.max_source_series, Some(10));
        assert_eq!(config.sentiment.score_timeout_ms, 1000);
    }
}
